mod balance;
mod cli;
mod dates;
mod editor;
mod entry;
mod error;
mod fmt;
mod ingest;
mod models;
mod period;
mod plan;
mod recurring;
mod reports;
mod repository;
mod settings;
mod sources;
mod store;
mod text;
mod value;

use clap::Parser;

use cli::{BillsCommands, Cli, Commands, EditCommands, PlanCommands, ReportCommands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = cli::resolve_settings(cli.data_dir.as_deref());

    let result = match cli.command {
        None | Some(Commands::Status) => cli::status::run(&settings),
        Some(Commands::Init) => cli::init::run(&settings),
        Some(Commands::Add {
            kind,
            amount,
            description,
            category,
            method,
            responsible,
            date,
            installments,
        }) => cli::add::run(
            &settings,
            cli::add::AddArgs {
                kind,
                amount,
                description,
                category,
                method,
                responsible,
                date,
                installments,
            },
        ),
        Some(Commands::Snapshot {
            account,
            amount,
            date,
            month,
        }) => cli::add::snapshot(&settings, &account, &amount, date.as_deref(), month.as_deref()),
        Some(Commands::Report { command }) => match command {
            ReportCommands::Overview { month } => cli::report::overview(&settings, month.as_deref()),
            ReportCommands::Income { month } => cli::report::income(&settings, month.as_deref()),
            ReportCommands::Detail {
                month,
                kinds,
                categories,
                responsible,
                methods,
                search,
            } => cli::report::detail_filter(&kinds, categories, responsible, methods, search)
                .and_then(|filter| cli::report::detail(&settings, month.as_deref(), filter)),
            ReportCommands::Invoice {
                month,
                from_date,
                to_date,
                card,
                no_credits,
                categories,
                responsible,
                search,
            } => cli::report::detail_filter(&[], categories, responsible, Vec::new(), search)
                .and_then(|filter| {
                    cli::report::invoice(
                        &settings,
                        cli::report::InvoiceArgs {
                            month,
                            from_date,
                            to_date,
                            card,
                            no_credits,
                            filter,
                        },
                    )
                }),
            ReportCommands::Upcoming => cli::report::upcoming(&settings),
        },
        Some(Commands::Bills { command }) => match command {
            BillsCommands::List { month } => cli::bills::list(&settings, month.as_deref()),
            BillsCommands::Add {
                description,
                due_day,
                category,
                responsible,
                amount,
            } => cli::bills::add(
                &settings,
                &description,
                due_day,
                &category,
                &responsible,
                amount.as_deref(),
            ),
            BillsCommands::Pay {
                description,
                amount,
                method,
                month,
            } => cli::bills::pay(
                &settings,
                &description,
                amount.as_deref(),
                &method,
                month.as_deref(),
            ),
        },
        Some(Commands::Plan { command }) => match command {
            PlanCommands::Show { month } => cli::plan::show(&settings, month.as_deref()),
            PlanCommands::Set {
                month,
                salary_a,
                salary_b,
                extras,
                investments,
                budget,
            } => cli::plan::set(
                &settings,
                cli::plan::PlanArgs {
                    month,
                    salary_a,
                    salary_b,
                    extras,
                    investments,
                    budget,
                },
            ),
        },
        Some(Commands::Edit { command }) => match command {
            EditCommands::Export { month, output } => {
                cli::edit::export(&settings, month.as_deref(), output)
            }
            EditCommands::Save { file, month } => cli::edit::save(&settings, &file, month.as_deref()),
        },
        Some(Commands::Import { file, replace }) => cli::import::run(&settings, &file, replace),
        Some(Commands::Backup { output }) => cli::backup::run(&settings, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
