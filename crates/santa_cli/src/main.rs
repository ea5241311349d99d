//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `santa_core` linkage.
//! - Run a seeded demo exchange so output stays deterministic.
//! - Write core log events under `SANTA_LOG_DIR`, or the system temp dir.

use rand::rngs::StdRng;
use rand::SeedableRng;
use santa_core::{
    EmailFormat, EmailGateway, Exchange, ExchangeService, ExchangeServiceConfig,
    ExchangeValidationError, GatewayError, Organizer, Participant, RenderRequest, RenderedEmail,
};
use std::path::PathBuf;
use std::process::ExitCode;

const DEMO_SEED: u64 = 2024;
const LOG_DIR_ENV: &str = "SANTA_LOG_DIR";

/// Prints each request instead of rendering or sending it.
struct StdoutGateway;

impl EmailGateway for StdoutGateway {
    fn send(&self, request: &RenderRequest) -> Result<(), GatewayError> {
        let receiver = &request.context["assignment"]["receiver"]["name"];
        println!(
            "to={} template={}/{} format={} receiver={}",
            request.recipient.address,
            request.template_group,
            request.template_name,
            request.format.as_str(),
            receiver
        );
        Ok(())
    }

    fn render(&self, request: &RenderRequest) -> Result<RenderedEmail, GatewayError> {
        Ok(RenderedEmail {
            subject: request.template_name.clone(),
            plaintext_body: String::new(),
            html_body: None,
        })
    }
}

fn log_dir() -> PathBuf {
    std::env::var_os(LOG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("santa_exchange"))
}

fn demo_exchange() -> Result<Exchange, ExchangeValidationError> {
    let mut exchange = Exchange::new(
        "Demo exchange",
        Organizer::new("Olive", Some("olive@example.com".to_string())),
    );
    exchange.date_and_time = "December 24".to_string();
    exchange.theme = "Anything goes".to_string();
    exchange.cost = "$20".to_string();

    let names = ["Ann", "Ben", "Cat", "Dan", "Eve"];
    let participants: Vec<Participant> = names
        .iter()
        .map(|name| {
            let lower = name.to_ascii_lowercase();
            Participant::new(*name, lower.clone(), format!("{lower}@example.com"))
        })
        .collect();
    let (ann, ben) = (participants[0].id, participants[1].id);
    for participant in participants {
        exchange.add_participant(participant)?;
    }
    if let Some(participant) = exchange.participant_mut(ann) {
        participant.add_conflict(ben);
    }
    exchange.mark_started();
    Ok(exchange)
}

fn main() -> ExitCode {
    println!("santa_core ping={}", santa_core::ping());
    println!("santa_core version={}", santa_core::core_version());

    let log_dir = log_dir();
    match santa_core::init_logging(santa_core::default_log_level(), &log_dir.to_string_lossy()) {
        Ok(()) => println!("logs={}", log_dir.display()),
        Err(err) => eprintln!("logging disabled: {err}"),
    }

    let config = ExchangeServiceConfig {
        sender_name: "Secret Santa".to_string(),
        sender_address: "santa@example.com".to_string(),
        template_group: "exchange".to_string(),
        default_email_format: EmailFormat::Plaintext,
        default_template_name: "notification".to_string(),
        max_attempts: 100,
    };
    let mut service =
        match ExchangeService::with_rng(config, StdoutGateway, StdRng::seed_from_u64(DEMO_SEED)) {
            Ok(service) => service,
            Err(err) => {
                eprintln!("config error: {err}");
                return ExitCode::FAILURE;
            }
        };

    let mut exchange = match demo_exchange() {
        Ok(exchange) => exchange,
        Err(err) => {
            eprintln!("demo exchange invalid: {err}");
            return ExitCode::FAILURE;
        }
    };
    match service.send_notifications(&mut exchange) {
        Ok(report) => {
            println!(
                "state={} sent={} failed={}",
                exchange.state().as_str(),
                report.sent,
                report.failures.len()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{demo_exchange, log_dir, LOG_DIR_ENV};
    use std::path::PathBuf;

    #[test]
    fn demo_exchange_passes_validation() {
        let exchange = demo_exchange().unwrap();
        assert_eq!(exchange.participants().len(), 5);
        assert!(exchange.validate().is_ok());
    }

    #[test]
    fn log_dir_prefers_env_and_falls_back_to_absolute_temp() {
        std::env::set_var(LOG_DIR_ENV, "/var/tmp/santa-logs");
        assert_eq!(log_dir(), PathBuf::from("/var/tmp/santa-logs"));

        std::env::remove_var(LOG_DIR_ENV);
        assert!(log_dir().is_absolute());
    }
}
