use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use wqi_catalog::Catalog;
use wqi_core::{
    aggregate_detailed, format_wqi, ClassPolicy, ParameterSet, Sample, ScoreResult,
};
use wqi_table::{export_batch, export_single, BatchInput};

use crate::config::ServerConfig;
use crate::metrics::Metrics;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, METHOD_NOT_FOUND};

const DEFAULT_MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const DEFAULT_LOCATION: &str = "Sample_001";
const RESOURCE_PREFIX: &str = "wqi://parameter-sets/";

pub struct WqiServer {
    catalog: Catalog,
    config: ServerConfig,
    metrics: Metrics,
}

impl WqiServer {
    pub fn new(config: ServerConfig, catalog: Catalog) -> Self {
        Self {
            catalog,
            config,
            metrics: Metrics::new(),
        }
    }

    pub fn from_env() -> Result<Self, String> {
        let config = ServerConfig::from_env()?;
        let catalog = config.load_catalog().map_err(|e| e.to_string())?;
        if catalog.get(&config.default_set).is_none() {
            return Err(format!(
                "WQI_DEFAULT_SET names unknown parameter set `{}`",
                config.default_set
            ));
        }
        Ok(Self::new(config, catalog))
    }

    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn render_metrics_text(&self) -> String {
        self.metrics.render_text()
    }

    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "invalid jsonrpc version",
            ));
        }

        let is_notification = request.id.is_none();
        let id = request.id.clone().unwrap_or(Value::Null);

        if is_notification && request.method.starts_with("notifications/") {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => {
                let protocol_version = request
                    .params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_MCP_PROTOCOL_VERSION);
                JsonRpcResponse::success(
                    id,
                    json!({
                        "protocolVersion": protocol_version,
                        "serverInfo": {"name": "wqi-mcp", "version": env!("CARGO_PKG_VERSION")},
                        "capabilities": {
                            "tools": {"listChanged": false},
                            "resources": {"subscribe": false, "listChanged": false}
                        }
                    }),
                )
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, tools_list_result()),
            "tools/call" => self.handle_tools_call(id, request.params),
            "resources/list" => JsonRpcResponse::success(id, self.resources_list_result()),
            "resources/read" => self.handle_resources_read(id, request.params),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "method not found"),
        };

        Some(response)
    }

    fn resources_list_result(&self) -> Value {
        let resources = self
            .catalog
            .iter()
            .map(|set| {
                json!({
                    "uri": format!("{RESOURCE_PREFIX}{}", set.name()),
                    "name": set.name(),
                    "description": format!(
                        "{} parameters scored with the {} model",
                        set.len(),
                        set.model().label()
                    ),
                    "mimeType": "application/json"
                })
            })
            .collect::<Vec<_>>();
        json!({ "resources": resources })
    }

    fn handle_resources_read(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ResourceReadParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => return JsonRpcResponse::invalid_params(id, format!("invalid params: {err}")),
        };

        let Some(set) = parsed
            .uri
            .strip_prefix(RESOURCE_PREFIX)
            .and_then(|name| self.catalog.get(name))
        else {
            return JsonRpcResponse::invalid_params(id, "unknown resource uri");
        };

        let text = match serde_json::to_string_pretty(&parameter_set_document(&set)) {
            Ok(v) => v,
            Err(err) => return JsonRpcResponse::error(id, -32000, err.to_string()),
        };
        JsonRpcResponse::success(
            id,
            json!({
                "contents": [{
                    "uri": parsed.uri,
                    "mimeType": "application/json",
                    "text": text
                }]
            }),
        )
    }

    fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ToolsCallParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => return JsonRpcResponse::invalid_params(id, format!("invalid params: {err}")),
        };

        let start = Instant::now();
        let response = match parsed.name.as_str() {
            "wqi_parameter_sets" => self.exec_parameter_sets(id, parsed.arguments),
            "wqi_score" => self.exec_score(id, parsed.arguments),
            "wqi_score_batch" => self.exec_score_batch(id, parsed.arguments),
            "wqi_classify" => self.exec_classify(id, parsed.arguments),
            _ => return JsonRpcResponse::error(id, METHOD_NOT_FOUND, "unknown tool"),
        };
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        let failed = response.is_failure();
        self.metrics.record_tool(&parsed.name, latency_ms, failed);
        debug!(tool = parsed.name.as_str(), latency_ms, failed, "tool call");
        response
    }

    fn resolve_set(&self, id: &Value, name: Option<&str>) -> Result<Arc<ParameterSet>, JsonRpcResponse> {
        let name = name.unwrap_or(&self.config.default_set);
        self.catalog.require(name).map_err(|err| {
            warn!(set = name, "request named an unknown parameter set");
            JsonRpcResponse::invalid_params(id.clone(), err.to_string())
        })
    }

    fn exec_parameter_sets(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: ParameterSetsInput = match parse_args_optional(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };

        let sets = match &args.set {
            Some(name) => match self.resolve_set(&id, Some(name.as_str())) {
                Ok(set) => vec![parameter_set_document(&set)],
                Err(resp) => return resp,
            },
            None => self
                .catalog
                .iter()
                .map(|set| parameter_set_document(set))
                .collect(),
        };

        let text = format!("{} parameter sets", sets.len());
        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "default_set": self.config.default_set,
                    "parameter_sets": sets
                },
                "content": [{"type": "text", "text": text}]
            }),
        )
    }

    fn exec_score(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: ScoreInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let set = match self.resolve_set(&id, args.set.as_deref()) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let location = args
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let scored = aggregate_detailed(&args.values, &set);
        let result = scored.result;

        let Ok((wqi, class)) = result.outcome() else {
            self.metrics.record_samples(set.name(), 0, 1);
            return JsonRpcResponse::success(
                id,
                json!({
                    "isError": true,
                    "structuredContent": {
                        "set": set.name(),
                        "location": location,
                        "wqi": Value::Null,
                        "class": result.class_label
                    },
                    "content": [{"type": "text", "text": result.class_label}]
                }),
            );
        };
        self.metrics.record_samples(set.name(), 1, 0);

        let csv = match export_single(&location, &args.values, &result, &set) {
            Ok(v) => v,
            Err(err) => return JsonRpcResponse::error(id, -32000, err.to_string()),
        };
        let display = format_wqi(wqi);
        let text = format!("WQI for {location}: {display} - {class}");

        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "set": set.name(),
                    "location": location,
                    "wqi": wqi,
                    "wqi_display": display,
                    "class": class,
                    "contributions": scored.contributions,
                    "csv": csv
                },
                "content": [{"type": "text", "text": text}]
            }),
        )
    }

    fn exec_score_batch(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: ScoreBatchInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let set = match self.resolve_set(&id, args.set.as_deref()) {
            Ok(v) => v,
            Err(resp) => return resp,
        };

        let input = match BatchInput::from_csv(&args.csv, &set) {
            Ok(v) => v,
            Err(err) => {
                warn!(set = set.name(), error = %err, "rejected batch upload");
                return JsonRpcResponse::invalid_params(id, format!("invalid csv: {err}"));
            }
        };
        if input.len() > self.config.max_batch_rows {
            return JsonRpcResponse::invalid_params(
                id,
                format!(
                    "batch has {} rows, limit is {}",
                    input.len(),
                    self.config.max_batch_rows
                ),
            );
        }

        let results = input.score(&set);
        let csv = match export_batch(&input, &results, &set) {
            Ok(v) => v,
            Err(err) => return JsonRpcResponse::error(id, -32000, err.to_string()),
        };

        let scored = results.iter().filter(|r| r.is_scored()).count();
        let unscored = results.len() - scored;
        self.metrics.record_samples(set.name(), scored, unscored);

        let rows = results
            .iter()
            .zip(&input.locations)
            .enumerate()
            .map(|(row, (result, location))| batch_row(row, location, result))
            .collect::<Vec<_>>();
        let text = format!("scored {scored} of {} rows with {}", rows.len(), set.name());

        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "set": set.name(),
                    "count": rows.len(),
                    "scored": scored,
                    "unscored": unscored,
                    "missing_parameters": input.missing_parameters,
                    "results": rows,
                    "csv": csv
                },
                "content": [{"type": "text", "text": text}]
            }),
        )
    }

    fn exec_classify(&self, id: Value, arguments: Option<Value>) -> JsonRpcResponse {
        let args: ClassifyInput = match parse_args(arguments) {
            Ok(v) => v,
            Err(resp) => return with_id(resp, id),
        };
        let policy = match args.policy {
            Some(policy) => policy,
            None => match self.resolve_set(&id, args.set.as_deref()) {
                Ok(set) => set.policy(),
                Err(resp) => return resp,
            },
        };
        let class = policy.classify(args.wqi);

        JsonRpcResponse::success(
            id,
            json!({
                "structuredContent": {
                    "wqi": args.wqi,
                    "policy": policy,
                    "class": class
                },
                "content": [{"type": "text", "text": class}]
            }),
        )
    }
}

fn batch_row(row: usize, location: &str, result: &ScoreResult) -> Value {
    json!({
        "row": row,
        "location": location,
        "wqi": result.wqi,
        "wqi_display": result.wqi.map(format_wqi),
        "class": result.class_label
    })
}

fn parameter_set_document(set: &ParameterSet) -> Value {
    json!({
        "name": set.name(),
        "model": set.model(),
        "policy": set.policy(),
        "bands": set.policy().bands(),
        "total_weight": set.total_weight(),
        "parameters": set.parameters()
    })
}

fn tools_list_result() -> Value {
    json!({
        "tools": [
            {
                "name": "wqi_parameter_sets",
                "description": "List the parameter sets (water bodies) available for scoring.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "set": {"type": "string"}
                    }
                }
            },
            {
                "name": "wqi_score",
                "description": "Compute the Water Quality Index of one sample and classify it.",
                "inputSchema": {
                    "type": "object",
                    "required": ["values"],
                    "properties": {
                        "set": {"type": "string"},
                        "location": {"type": "string"},
                        "values": {
                            "type": "object",
                            "additionalProperties": {"type": ["number", "null"]}
                        }
                    }
                }
            },
            {
                "name": "wqi_score_batch",
                "description": "Score every row of a CSV upload; columns are matched to parameter names.",
                "inputSchema": {
                    "type": "object",
                    "required": ["csv"],
                    "properties": {
                        "set": {"type": "string"},
                        "csv": {"type": "string"}
                    }
                }
            },
            {
                "name": "wqi_classify",
                "description": "Map a WQI score onto a quality band.",
                "inputSchema": {
                    "type": "object",
                    "required": ["wqi"],
                    "properties": {
                        "wqi": {"type": "number"},
                        "policy": {"type": "string", "enum": ["ascending_bad", "descending_good"]},
                        "set": {"type": "string"}
                    }
                }
            }
        ]
    })
}

fn with_id(mut response: JsonRpcResponse, id: Value) -> JsonRpcResponse {
    response.id = id;
    response
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    let Some(args) = arguments else {
        return Err(JsonRpcResponse::invalid_params(
            Value::Null,
            "missing tool arguments",
        ));
    };

    serde_json::from_value(args).map_err(|err| {
        JsonRpcResponse::invalid_params(Value::Null, format!("invalid tool arguments: {err}"))
    })
}

fn parse_args_optional<T: for<'de> Deserialize<'de> + Default>(
    arguments: Option<Value>,
) -> Result<T, JsonRpcResponse> {
    match arguments {
        Some(v) => serde_json::from_value(v).map_err(|err| {
            JsonRpcResponse::invalid_params(Value::Null, format!("invalid tool arguments: {err}"))
        }),
        None => Ok(T::default()),
    }
}

#[derive(Debug, Deserialize)]
struct ToolsCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
struct ParameterSetsInput {
    set: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScoreInput {
    set: Option<String>,
    location: Option<String>,
    values: Sample,
}

#[derive(Debug, Deserialize)]
struct ScoreBatchInput {
    set: Option<String>,
    csv: String,
}

#[derive(Debug, Deserialize)]
struct ClassifyInput {
    wqi: f64,
    policy: Option<ClassPolicy>,
    set: Option<String>,
}
