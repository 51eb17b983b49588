use std::time::Duration;

use ledgerline_core::config::{AppConfig, LoadOptions};
use ledgerline_db::{connect_lazy_with_settings, ProcedureGateway, SqlProcedureGateway};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\
                 \"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_collaborators(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("database_connectivity"));
            checks.push(skipped("nlu_reachability"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_collaborators(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: details.clone(),
                },
                DoctorCheck { name: "nlu_reachability", status: CheckStatus::Fail, details },
            ];
        }
    };

    runtime.block_on(async {
        vec![check_database_connectivity(config).await, check_nlu_reachability(config).await]
    })
}

async fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    match ping_database(config).await {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!(
                "connected using `{}`",
                super::config::redact_url(&config.database.url)
            ),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

async fn ping_database(config: &AppConfig) -> Result<(), String> {
    let pool = connect_lazy_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .map_err(|error| format!("failed to build database pool: {error}"))?;
    let gateway = SqlProcedureGateway::new(
        pool.clone(),
        &config.database.ledger_procedure,
        &config.database.product_procedure,
    );

    let ping = gateway.ping().await.map_err(|error| format!("database ping failed: {error}"));
    pool.close().await;
    ping
}

async fn check_nlu_reachability(config: &AppConfig) -> DoctorCheck {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.nlu.timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "nlu_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to build http client: {error}"),
            }
        }
    };

    match client.get(&config.nlu.base_url).send().await {
        Ok(response) if response.status().is_server_error() => DoctorCheck {
            name: "nlu_reachability",
            status: CheckStatus::Fail,
            details: format!("`{}` answered {}", config.nlu.base_url, response.status()),
        },
        Ok(response) => DoctorCheck {
            name: "nlu_reachability",
            status: CheckStatus::Pass,
            details: format!("`{}` answered {}", config.nlu.base_url, response.status()),
        },
        Err(error) => DoctorCheck {
            name: "nlu_reachability",
            status: CheckStatus::Fail,
            details: format!("nlu request failed: {error}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
