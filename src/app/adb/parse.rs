use crate::app::models::UNKNOWN_MODEL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub serial: String,
    pub state: String,
    pub model: Option<String>,
}

impl DeviceSummary {
    pub fn is_ready(&self) -> bool {
        self.state == "device"
    }

    pub fn display_model(&self) -> String {
        self.model
            .as_deref()
            .map(|model| model.replace('_', " "))
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_MODEL.to_string())
    }
}

/// Parses `adb devices -l` output, skipping the header and daemon banner lines.
pub fn parse_adb_devices(output: &str) -> Vec<DeviceSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.to_lowercase().contains("list of devices"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                return None;
            }
            let model = tokens
                .iter()
                .skip(2)
                .find_map(|token| token.strip_prefix("model:"))
                .map(|value| value.to_string());
            Some(DeviceSummary {
                serial: tokens[0].to_string(),
                state: tokens[1].to_string(),
                model,
            })
        })
        .collect()
}

/// First non-empty line of `getprop <key>` output.
pub fn parse_getprop_value(output: &str) -> Option<String> {
    output
        .lines()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(|line| line.to_string())
}
