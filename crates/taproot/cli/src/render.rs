//! Terminal rendering for progress updates.

use colored::*;
use taproot_project::ProjectUpdate;

pub fn update(update: &ProjectUpdate) {
    match update {
        ProjectUpdate::Synthing => info("synthesizing stacks..."),
        ProjectUpdate::Synthed {
            stacks,
            error_message,
        } => match error_message {
            Some(message) => error(&format!("synthesis failed: {message}")),
            None => {
                let names: Vec<&str> = stacks.iter().map(|s| s.name.as_str()).collect();
                success(&format!(
                    "synthesized {} stack(s): {}",
                    stacks.len(),
                    names.join(", ")
                ));
            }
        },
        ProjectUpdate::Diffing { stack_name } => info(&format!("planning {stack_name}...")),
        ProjectUpdate::Diffed { stack_name, plan } => {
            if !plan.summary.trim().is_empty() {
                println!("{}", plan.summary.trim_end());
            }
            success(&format!("plan ready for {stack_name}"));
        }
        ProjectUpdate::Deploying { stack_name } => info(&format!("deploying {stack_name}...")),
        ProjectUpdate::DeployUpdate { deploy_output, .. } => {
            println!("  {}", deploy_output.dimmed());
        }
        ProjectUpdate::Deployed {
            stack_name,
            outputs,
            ..
        } => {
            success(&format!("deployed {stack_name}"));
            for (name, value) in outputs {
                println!("  {} = {}", name.bold(), value);
            }
        }
        ProjectUpdate::Destroying { stack_name } => info(&format!("destroying {stack_name}...")),
        ProjectUpdate::DestroyUpdate { destroy_output, .. } => {
            println!("  {}", destroy_output.dimmed());
        }
        ProjectUpdate::Destroyed { stack_name } => success(&format!("destroyed {stack_name}")),
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
