use std::process;

use dairyops_core::password::password_strength;
use dairyops_core::{validate_password, RuleViolation};

use crate::OutputFormat;

/// Check `candidate` against the password policy. Exits 1 when any rule
/// is violated.
pub(crate) fn cmd_check(candidate: &str, output: OutputFormat, quiet: bool) {
    let violations = validate_password(candidate);
    let strength = password_strength(candidate);

    match output {
        OutputFormat::Json => {
            let messages: Vec<&str> = violations.iter().map(|v| v.message()).collect();
            let json = serde_json::json!({
                "valid": violations.is_empty(),
                "violations": messages,
                "strength": strength,
                "rules": RuleViolation::ALL.len(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if !quiet {
                if violations.is_empty() {
                    println!("ok ({}/{})", strength, RuleViolation::ALL.len());
                } else {
                    println!(
                        "weak password ({}/{} rules met), still needs:",
                        strength,
                        RuleViolation::ALL.len()
                    );
                    for v in &violations {
                        println!("  - {}", v.message());
                    }
                }
            }
        }
    }

    if !violations.is_empty() {
        process::exit(1);
    }
}
