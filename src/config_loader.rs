use crate::config::Config;
use crate::rows::RowError;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Column spellings accepted for each required switch column
pub const SWITCH_COLUMNS: &[&[&str]] = &[
    &["Vlan", "vlan", "VLAN"],
    &["Description", "description"],
    &["Ports", "ports"],
];

/// Column spellings accepted for each required router column
pub const ROUTER_COLUMNS: &[&[&str]] = &[
    &["network", "Network"],
    &["interface", "Interface"],
    &["ipaddress", "IP Address"],
    &["subnetmask", "Netmask"],
    &["defaultgateway", "Gateway"],
];

/// Load and parse a job file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    // Open the configuration file
    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    // Parse the YAML content
    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    // Validate the configuration
    config.validate()?;

    Ok(config)
}

/// Check a CSV header line before any row is processed.
///
/// Missing required columns are an error; unexpected columns only warn,
/// since sheets often carry notes the builders ignore.
pub fn check_csv_headers(
    csv_path: &Path,
    delimiter: u8,
    required: &[&[&str]],
    known: &[&str],
) -> std::result::Result<(), RowError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(csv_path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    for spellings in required {
        if !headers.iter().any(|h| spellings.contains(&h.as_str())) {
            return Err(RowError::MissingColumn {
                column: spellings[0].to_string(),
                found: headers.join(", "),
            });
        }
    }

    for header in &headers {
        let expected = known.contains(&header.as_str())
            || required.iter().any(|spellings| spellings.contains(&header.as_str()));
        if !expected {
            warn!("Column '{}' in {:?} is ignored", header, csv_path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_switch_config() {
        let yaml = r#"
device:
  host: 192.168.100.100
  username: admin
csv:
  path: layer3.csv
switch:
  kind: layer3
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.device().unwrap().host, "192.168.100.100");
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let yaml = "device:\n  host: 10.0.0.1\n  username: admin\n  port: 0\n";

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config(Path::new("/nonexistent/job.yaml")).is_err());
    }

    #[test]
    fn test_check_headers_accepts_switch_sheet() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Vlan ; Description ; Ports ; IP Address ; Netmask ; Notes").unwrap();
        writeln!(temp_file, "10;Staff;1-4;;;").unwrap();

        check_csv_headers(temp_file.path(), b';', SWITCH_COLUMNS, &["IP Address", "Netmask"]).unwrap();
    }

    #[test]
    fn test_check_headers_reports_missing_column() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Vlan;Description").unwrap();

        let err = check_csv_headers(temp_file.path(), b';', SWITCH_COLUMNS, &[]).unwrap_err();
        assert!(matches!(err, RowError::MissingColumn { ref column, .. } if column == "Ports"));
    }

    #[test]
    fn test_check_headers_wrong_delimiter() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Vlan,Description,Ports").unwrap();

        assert!(check_csv_headers(temp_file.path(), b';', SWITCH_COLUMNS, &[]).is_err());
    }
}
