use std::process;
use std::time::Instant;

use dairyops_controller::{AccountCreationFlow, AccountError};
use dairyops_core::Role;
use dairyops_storage::http::HttpBackend;
use dairyops_storage::FieldErrors;

use crate::config::Settings;
use crate::{report_error, OutputFormat};

pub(crate) struct NewAccount {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

pub(crate) async fn cmd_create_account(
    settings: &Settings,
    account: NewAccount,
    output: OutputFormat,
    quiet: bool,
) {
    let mut flow = match AccountCreationFlow::open(settings.session.clone()) {
        Ok(flow) => flow,
        Err(e) => fail(&e, output, quiet),
    };
    flow.set_username(account.username);
    flow.set_password(account.password);
    flow.set_confirm_password(account.confirm_password);
    flow.set_role(account.role);

    let backend = HttpBackend::new(settings.base_url.clone());
    match flow.create_account(&backend, Instant::now()).await {
        Ok(created) => match output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&created).unwrap_or_default()
                );
            }
            OutputFormat::Text => {
                if !quiet {
                    println!(
                        "created account '{}' ({})",
                        created.username,
                        created.role.as_str()
                    );
                }
            }
        },
        Err(e) => fail(&e, output, quiet),
    }
}

fn fail(error: &AccountError, output: OutputFormat, quiet: bool) -> ! {
    if quiet {
        process::exit(1);
    }
    let errors = error.field_errors();
    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({ "error": error.to_string(), "fields": errors });
            eprintln!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputFormat::Text => report_error(&render(&errors), output, quiet),
    }
    process::exit(1);
}

fn render(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| {
            if field == FieldErrors::NON_FIELD {
                messages.join(" ")
            } else {
                format!("{}: {}", field, messages.join(" "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
