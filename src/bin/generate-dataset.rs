/// Generate a synthetic IAM incident dataset
///
/// Writes a reproducible CSV (fixed seed) shaped like a service-desk export,
/// with hosts, IPs and URLs embedded in the descriptions so entity overlap has
/// something to find.
///
/// Usage: generate-dataset [rows] [output.csv]

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const SEED: u64 = 42;
const DEFAULT_ROWS: usize = 220;
const DEFAULT_OUTPUT: &str = "data/raw/iam_test_dataset.csv";

const ASSETS: &[(&str, &str, &str)] = &[
    ("srv-pingfed-01", "10.24.66.14", "Secure Access"),
    ("srv-pingfed-02", "10.24.66.15", "Secure Access"),
    ("idm-sail-01", "10.24.88.18", "Identity Engineering"),
    ("idm-sail-02", "10.24.88.19", "Identity Engineering"),
    ("dir-sync-01", "10.24.90.11", "Directory Management"),
    ("plainid-app-01", "10.24.77.20", "Authorization Team"),
    ("login.auth0.com", "172.19.45.201", "Secure Access"),
    ("mfa-gateway-01", "10.24.66.20", "Secure Access"),
];

const THEMES: &[&str] = &[
    "MFA push not received",
    "PingID authentication timeout",
    "SailPoint aggregation failure",
    "Directory sync delay",
    "Auth0 login error 401",
    "PlainID authorization denied",
    "High CPU on server",
    "High memory consumption",
    "LDAP connection failure",
    "Provisioning workflow stuck",
];

const USERS: &[&str] = &[
    "john.doe@company.com",
    "jane.smith@company.com",
    "rita.kapoor@company.com",
    "alex.jones@company.com",
    "mark.brown@company.com",
    "david.lee@company.com",
];

const ASSIGNEES: &[&str] = &["Alice Morgan", "Rahul Desai", "Meera Iyer", "Daniel Shah"];
const SEVERITIES: &[&str] = &["Critical", "High", "Medium", "Low"];
const STATUSES: &[&str] = &["Open", "Resolved", "Closed", "In Progress"];

#[derive(Debug, Serialize)]
struct IncidentRow {
    #[serde(rename = "Incident ID")]
    incident_id: String,
    #[serde(rename = "Opened At")]
    opened_at: String,
    #[serde(rename = "Short Description")]
    short_description: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Priority")]
    priority: u8,
    #[serde(rename = "Severity")]
    severity: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Resolved At")]
    resolved_at: String,
    #[serde(rename = "Closed At")]
    closed_at: String,
    #[serde(rename = "Assigned To")]
    assigned_to: String,
    #[serde(rename = "Assignment Group")]
    assignment_group: String,
    #[serde(rename = "Configuration Item")]
    configuration_item: String,
}

fn pick<'a, R: Rng>(rng: &mut R, values: &'a [&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or_default()
}

fn format_time(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn generate_rows(count: usize) -> Result<Vec<IncidentRow>> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let start = NaiveDate::from_ymd_opt(2025, 2, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("Invalid start date")?;

    let mut rows = Vec::with_capacity(count);
    for i in 1..=count {
        let &(asset, ip, group) = ASSETS.choose(&mut rng).context("No assets")?;
        let theme = pick(&mut rng, THEMES);
        let user = pick(&mut rng, USERS);

        let opened = start + Duration::hours(rng.gen_range(0..=720));
        let resolved = opened + Duration::hours(rng.gen_range(1..=6));
        let closed = resolved + Duration::minutes(rng.gen_range(10..=45));

        let description = format!(
            "Incident involving {theme}. Affected asset: {asset}. Source IP: {ip}. \
             User reported: {user}. URL https://{asset}/auth returned errors intermittently."
        );

        rows.push(IncidentRow {
            incident_id: format!("INC{}", 100_000 + i),
            opened_at: format_time(opened),
            short_description: theme.to_string(),
            description,
            priority: rng.gen_range(1..=4),
            severity: pick(&mut rng, SEVERITIES).to_string(),
            status: pick(&mut rng, STATUSES).to_string(),
            resolved_at: format_time(resolved),
            closed_at: format_time(closed),
            assigned_to: pick(&mut rng, ASSIGNEES).to_string(),
            assignment_group: group.to_string(),
            configuration_item: asset.to_string(),
        });
    }

    Ok(rows)
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let count = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid row count: {}", raw))?,
        None => DEFAULT_ROWS,
    };
    let output = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    if let Some(parent) = std::path::Path::new(&output).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let rows = generate_rows(count)?;
    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("Failed to create {}", output))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("Dataset generated: {} ({} rows)", output, rows.len());
    Ok(())
}
