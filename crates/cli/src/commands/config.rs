use std::env;
use std::fs;
use std::path::Path;

use parley_agent::WorkspaceSource;
use parley_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let conversation = &config.conversation;
    let password = if conversation.password.is_some() { "<redacted>" } else { "<unset>" };
    let fields: [(&str, String, &[&str]); 9] = [
        (
            "conversation.base_url",
            conversation.base_url.clone(),
            &["PARLEY_CONVERSATION_BASE_URL"],
        ),
        (
            "conversation.version_date",
            conversation.version_date.clone(),
            &["PARLEY_CONVERSATION_VERSION_DATE"],
        ),
        (
            "conversation.username",
            conversation.username.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["PARLEY_CONVERSATION_USERNAME", "CONVERSATION_USERNAME"],
        ),
        (
            "conversation.password",
            password.to_string(),
            &["PARLEY_CONVERSATION_PASSWORD", "CONVERSATION_PASSWORD"],
        ),
        ("server.bind_address", config.server.bind_address.clone(), &["PARLEY_SERVER_BIND_ADDRESS"]),
        ("server.port", config.server.port.to_string(), &["PARLEY_SERVER_PORT"]),
        (
            "server.static_dir",
            config.server.static_dir.display().to_string(),
            &["PARLEY_SERVER_STATIC_DIR"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["PARLEY_LOGGING_LEVEL", "PARLEY_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["PARLEY_LOGGING_FORMAT", "PARLEY_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        fields.iter().map(|(key, value, env_keys)| render_line(key, value, source(*key, *env_keys))),
    );

    // Read per request by the server, never from the config file.
    let workspace = WorkspaceSource::default()
        .resolve()
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(format!("- workspace = {workspace} (source: env (WORKSPACE_ID), read per request)"));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};

    #[test]
    fn nested_keys_are_found_in_file_documents() {
        let doc: toml::Value = "[conversation]\nbase_url = \"http://localhost\"\n"
            .parse()
            .expect("toml document");

        assert!(contains_path(&doc, "conversation.base_url"));
        assert!(!contains_path(&doc, "conversation.username"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn file_source_names_the_file() {
        let doc: toml::Value = "[server]\nport = 9000\n".parse().expect("toml document");

        let source = field_source(
            "server.port",
            &["PARLEY_TEST_UNSET_PORT_KEY"],
            Some(&doc),
            Some(std::path::Path::new("parley.toml")),
        );

        assert_eq!(source, "file (parley.toml)");
        assert_eq!(field_source("server.bind_address", &[], Some(&doc), None), "default");
    }
}
