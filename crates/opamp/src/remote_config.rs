//! Extraction of remote resource attributes from the server's first
//! configuration push.

use std::collections::HashMap;

use beacon_common::proto::ServerToAgent;
use serde::Deserialize;

/// Config map entry holding the SDK settings, including resource attributes.
pub const SDK_CONFIG_KEY: &str = "SDK";

#[derive(Deserialize)]
struct SdkConfigBody {
    #[serde(rename = "remoteResourceAttributes", default)]
    remote_resource_attributes: Vec<RemoteResourceAttribute>,
}

#[derive(Deserialize)]
struct RemoteResourceAttribute {
    key: String,
    value: String,
}

/// Flatten the `"SDK"` config entry into a key/value map.
///
/// Returns an empty map when the entry is absent, its body is not valid
/// JSON, or the attribute list is empty; each case is logged and the caller
/// continues without attributes. Never touches session state.
pub fn extract_resource_attributes(resp: &ServerToAgent) -> HashMap<String, String> {
    let Some(file) = resp
        .remote_config
        .as_ref()
        .and_then(|rc| rc.config.as_ref())
        .and_then(|map| map.config_map.get(SDK_CONFIG_KEY))
    else {
        tracing::warn!("no SDK entry in remote config, continuing without resource attributes");
        return HashMap::new();
    };

    let body: SdkConfigBody = match serde_json::from_slice(&file.body) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "malformed SDK config body");
            return HashMap::new();
        }
    };

    if body.remote_resource_attributes.is_empty() {
        tracing::warn!("SDK config carried no resource attributes");
        return HashMap::new();
    }

    body.remote_resource_attributes
        .into_iter()
        .map(|attr| (attr.key, attr.value))
        .collect()
}
