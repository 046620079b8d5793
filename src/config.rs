use std::net::IpAddr;
use std::time::Duration;

use ipnet::IpNet;

use crate::submission::priority::PriorityPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub ingest_token: Option<String>,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
    pub business: BusinessSettings,
    pub intake: IntakeSettings,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Values interpolated into outbound notifications.
#[derive(Debug, Clone)]
pub struct BusinessSettings {
    pub company_name: String,
    pub business_email: String,
    pub admin_email: String,
    pub link_url: String,
    pub dashboard_url: String,
}

/// Knobs for the intake pipeline itself.
#[derive(Debug, Clone)]
pub struct IntakeSettings {
    pub response_id_prefix: String,
    pub priority_policy: PriorityPolicy,
    pub email_notifications: bool,
    pub slack_webhook_url: Option<String>,
    /// Submissions allowed per email address per 24 hours. `0` disables the check.
    pub rate_limit_per_email: u32,
    /// Hour of day (UTC) the daily report goes out.
    pub report_hour: u32,
    pub send_timeout: Duration,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            company_name: "The IAH Creations".to_string(),
            business_email: "contact@iahcreations.com".to_string(),
            admin_email: "admin@iahcreations.com".to_string(),
            link_url: "https://linktr.ee/theiahcreations".to_string(),
            dashboard_url: String::new(),
        }
    }
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            response_id_prefix: crate::submission::response_id::DEFAULT_PREFIX.to_string(),
            priority_policy: PriorityPolicy::Sequential,
            email_notifications: true,
            slack_webhook_url: None,
            rate_limit_per_email: 5,
            report_hour: 9,
            send_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());

        let host: IpAddr = env_or("LEADDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid LEADDESK_HOST: {e}"))?;

        let port: u16 = env_or("LEADDESK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid LEADDESK_PORT: {e}"))?;

        let max_body_size: usize = env_or("LEADDESK_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid LEADDESK_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("LEADDESK_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid LEADDESK_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ingest_token = std::env::var("LEADDESK_INGEST_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        let log_level = env_or("LEADDESK_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("LEADDESK_SMTP_HOST").ok(),
            std::env::var("LEADDESK_SMTP_PORT").ok(),
            std::env::var("LEADDESK_SMTP_USER").ok(),
            std::env::var("LEADDESK_SMTP_PASS").ok(),
            std::env::var("LEADDESK_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid LEADDESK_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let defaults = BusinessSettings::default();
        let business = BusinessSettings {
            company_name: env_or("LEADDESK_COMPANY_NAME", &defaults.company_name),
            business_email: env_or("LEADDESK_BUSINESS_EMAIL", &defaults.business_email),
            admin_email: env_required("LEADDESK_ADMIN_EMAIL")?,
            link_url: env_or("LEADDESK_LINK_URL", &defaults.link_url),
            dashboard_url: env_or("LEADDESK_DASHBOARD_URL", ""),
        };

        let priority_policy = env_or("LEADDESK_PRIORITY_POLICY", "sequential")
            .parse()
            .map_err(|e| format!("Invalid LEADDESK_PRIORITY_POLICY: {e}"))?;

        let email_notifications = parse_bool(&env_or("LEADDESK_EMAIL_NOTIFICATIONS", "true"))
            .ok_or("Invalid LEADDESK_EMAIL_NOTIFICATIONS: expected true/false")?;

        let slack_webhook_url = std::env::var("LEADDESK_SLACK_WEBHOOK_URL")
            .ok()
            .filter(|s| !s.is_empty());

        let rate_limit_per_email: u32 = env_or("LEADDESK_RATE_LIMIT_PER_EMAIL", "5")
            .parse()
            .map_err(|e| format!("Invalid LEADDESK_RATE_LIMIT_PER_EMAIL: {e}"))?;

        let report_hour: u32 = env_or("LEADDESK_REPORT_HOUR", "9")
            .parse()
            .map_err(|e| format!("Invalid LEADDESK_REPORT_HOUR: {e}"))?;
        if report_hour > 23 {
            return Err(format!("Invalid LEADDESK_REPORT_HOUR: {report_hour} is not an hour of day"));
        }

        let send_timeout_secs: u64 = env_or("LEADDESK_SEND_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid LEADDESK_SEND_TIMEOUT_SECS: {e}"))?;

        let intake = IntakeSettings {
            response_id_prefix: env_or(
                "LEADDESK_RESPONSE_ID_PREFIX",
                crate::submission::response_id::DEFAULT_PREFIX,
            ),
            priority_policy,
            email_notifications,
            slack_webhook_url,
            rate_limit_per_email,
            report_hour,
            send_timeout: Duration::from_secs(send_timeout_secs),
        };

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            trusted_proxies,
            ingest_token,
            log_level,
            smtp,
            business,
            intake,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
