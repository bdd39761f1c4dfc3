use crate::infra::{seed_marketplace, Services};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::sync::Arc;
use volunteer_hub::config::WorkflowConfig;
use volunteer_hub::error::AppError;
use volunteer_hub::workflows::applications::ResponseType;
use volunteer_hub::workflows::memory::MemoryNotifications;
use volunteer_hub::workflows::provider::RoleOverview;
use volunteer_hub::workflows::Notice;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date for the role dashboard (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Reject the sample application instead of accepting it.
    #[arg(long)]
    pub(crate) reject: bool,
    /// Skip the suspension and reactivation walk-through.
    #[arg(long)]
    pub(crate) skip_suspension: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        reject,
        skip_suspension,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let config = WorkflowConfig::default();
    let mailbox = Arc::new(MemoryNotifications::new());
    let services = Services::with_notifier(&config, mailbox.clone());

    println!("{} volunteering workflow demo", config.site_name);
    let seeded = seed_marketplace(&services, today)?;
    println!(
        "- Organisation {} \"{}\" created from profile {}",
        seeded.organisation.id, seeded.organisation.label, seeded.profile.id
    );
    println!(
        "- Role {} published; application {} submitted by account {}",
        seeded.role.id, seeded.application, seeded.volunteer
    );

    let (response_type, text) = if reject {
        (ResponseType::Rejected, "The role has been filled, thank you.")
    } else {
        (ResponseType::Accepted, "We would love to have you on the towpath.")
    };
    let outcome = services.applications.respond(
        seeded.application,
        seeded.coordinator,
        response_type,
        text,
    )?;
    println!(
        "- Application {} is now {}",
        outcome.submission.id,
        outcome.submission.status().label()
    );
    render_notices(&outcome.notices);

    let view = services
        .applications
        .view(seeded.application, seeded.teammate)?;
    println!(
        "- Teammate view shows e-mail: {}",
        view.email.as_deref().unwrap_or("(hidden until accepted)")
    );

    let overview = services
        .providers
        .role_overview(seeded.organisation.id, today)?;
    render_overview(&overview);

    if !skip_suspension {
        println!("\nSuspension walk-through");
        let suspension = services.providers.suspend(seeded.organisation.id)?;
        for entry in suspension.restore_plan.entries() {
            println!(
                "- Recorded content {} at revision {} ({})",
                entry.content_id,
                entry.revision_id,
                entry.target_state.label()
            );
        }
        render_notices(&suspension.notices);

        let reactivation = services.providers.reactivate(seeded.organisation.id)?;
        println!(
            "- Reactivated: {} restored, {} skipped",
            reactivation.restored.len(),
            reactivation.skipped.len()
        );
        render_notices(&reactivation.notices);
    }

    let events = mailbox.events();
    if events.is_empty() {
        println!("\nNotifications: none dispatched");
    } else {
        println!("\nNotifications");
        for event in events {
            println!(
                "- {} -> {} ({})",
                event.key.label(),
                event.recipients.join(", "),
                event.subject
            );
        }
    }

    Ok(())
}

fn render_overview(overview: &RoleOverview) {
    println!("\nRoles for {} (as of dashboard date)", overview.label);
    for section in &overview.sections {
        if section.roles.is_empty() {
            continue;
        }
        println!("  {}", section.title);
        for role in &section.roles {
            println!(
                "    - {} | {} awaiting response | {} responded{}",
                role.title,
                role.applications.awaiting_response,
                role.applications.responded,
                if role.pending { " | pending edit" } else { "" }
            );
        }
    }
}

fn render_notices(notices: &[Notice]) {
    for notice in notices {
        println!("  [{:?}] {}", notice.level, notice.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_end_to_end() {
        let args = DemoArgs {
            today: Some(NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")),
            reject: false,
            skip_suspension: false,
        };
        run_demo(args).expect("demo completes");
    }
}
