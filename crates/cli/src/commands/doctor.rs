use parley_agent::WorkspaceSource;
use parley_core::config::{AppConfig, LoadOptions};
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
    let report = build_report(&WorkspaceSource::default());

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(workspace: &WorkspaceSource) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_workspace(workspace));
            checks.push(check_credentials(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(check_workspace(workspace));
            checks.push(DoctorCheck {
                name: "upstream_credentials",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
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

fn check_workspace(workspace: &WorkspaceSource) -> DoctorCheck {
    match workspace.resolve() {
        Some(workspace_id) => DoctorCheck {
            name: "workspace_configured",
            status: CheckStatus::Pass,
            details: format!("workspace `{workspace_id}` will receive messages"),
        },
        None => DoctorCheck {
            name: "workspace_configured",
            status: CheckStatus::Fail,
            details: "WORKSPACE_ID is unset or a placeholder; replies will carry setup instructions"
                .to_string(),
        },
    }
}

fn check_credentials(config: &AppConfig) -> DoctorCheck {
    if config.conversation.has_credentials() {
        DoctorCheck {
            name: "upstream_credentials",
            status: CheckStatus::Pass,
            details: format!(
                "basic auth configured for `{}`",
                config.conversation.username.as_deref().unwrap_or_default()
            ),
        }
    } else {
        DoctorCheck {
            name: "upstream_credentials",
            status: CheckStatus::Fail,
            details: "conversation.username and conversation.password are not set".to_string(),
        }
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
