use std::path::PathBuf;

use crate::editor::{export_period, read_edited, save_period};
use crate::error::{CaixaError, Result};
use crate::period::Period;
use crate::settings::Settings;

use super::{default_export_path, open_repo, resolve_period};

pub fn export(settings: &Settings, month: Option<&str>, output: Option<String>) -> Result<()> {
    let repo = open_repo(settings)?;
    let period = resolve_period(&repo.ledger()?.ledger, month)?;
    let path = match output {
        Some(p) => PathBuf::from(p),
        None => default_export_path(settings, period),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&path)?;
    let count = export_period(&repo, period, std::io::BufWriter::new(file))?;
    println!("{count} rows of {period} written to {}", path.display());
    println!("Edit the file, then run `caixa edit save {}`.", path.display());
    Ok(())
}

pub fn save(settings: &Settings, file: &str, month: Option<&str>) -> Result<()> {
    let edited = read_edited(std::fs::File::open(file)?)?;
    let period = edited.period;
    if let Some(m) = month {
        let asked: Period = m.parse()?;
        if asked != period {
            return Err(CaixaError::Other(format!(
                "{file} was exported for {period}, not {asked}"
            )));
        }
    }
    let repo = open_repo(settings)?;
    let summary = save_period(&repo, &edited)?;
    println!(
        "{period} saved: {} rows replaced by {}, {} other rows kept.",
        summary.replaced, summary.written, summary.kept
    );
    if !summary.backed_up {
        println!("Warning: the automatic backup could not be written.");
    }
    Ok(())
}
