use std::time::Instant;

use num_complex::Complex32;
use rf_backend::{Backend, WindowKind};
use rf_kernels::matched_filter::MatchedFilterCache;
use rf_kernels::{choi_williams, fam_scf, higher_order_cumulants, psd_welch, rf_dna_features, wigner_ville};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{Result, ServiceError};
use crate::stats::ServiceStats;

/// Everything a single dispatch needs: the numeric backend, the matched
/// filter cache (shared across requests so RRC/Gaussian taps aren't
/// recomputed), and the running stats counters.
pub struct DispatchContext<'a> {
    pub backend: &'a dyn Backend,
    pub filter_cache: &'a MatchedFilterCache,
    pub stats: &'a ServiceStats,
    pub log_requests: bool,
}

/// Wire request envelope (SPEC_FULL.md §4.5). `iq_real`/`iq_imag` are
/// parallel arrays; their presence (both, same length) is what makes IQ
/// data available to a handler.
#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    command: String,
    #[serde(default)]
    params: Value,
    iq_real: Option<Vec<f32>>,
    iq_imag: Option<Vec<f32>>,
}

fn param_f64(params: &Value, key: &str, default: f64) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn param_u64(params: &Value, key: &str, default: u64) -> u64 {
    params.get(key).and_then(Value::as_u64).unwrap_or(default)
}

fn param_bool(params: &Value, key: &str, default: bool) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn param_str<'a>(params: &'a Value, key: &str, default: &'a str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn param_opt_u64(params: &Value, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}

/// A parsed request, shared between the JSON dispatch path and, behind the
/// `arrow-transport` feature, the Arrow IPC intercept in `main`.
pub struct ParsedRequest {
    pub command: String,
    pub params: Value,
    pub samples: Option<Vec<Complex32>>,
}

/// Parse a raw frame into a [`ParsedRequest`]. The `Err` string is already
/// formatted as the `"Invalid JSON: ..."` message SPEC_FULL.md §4.7
/// specifies for malformed frames.
pub fn parse_request(raw: &[u8]) -> std::result::Result<ParsedRequest, String> {
    let text = std::str::from_utf8(raw).map_err(|e| format!("Invalid JSON: {e}"))?;
    let request: Request = serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {e}"))?;
    let samples = match (&request.iq_real, &request.iq_imag) {
        (Some(re), Some(im)) if re.len() == im.len() => Some(
            re.iter()
                .zip(im.iter())
                .map(|(&r, &i)| Complex32::new(r, i))
                .collect::<Vec<_>>(),
        ),
        _ => None,
    };
    Ok(ParsedRequest {
        command: request.command.to_ascii_lowercase(),
        params: request.params,
        samples,
    })
}

/// Parse one raw frame as a JSON request, dispatch it, and serialize the
/// response. Unlike the command handlers below, a JSON parse failure never
/// touches `ctx.stats` (SPEC_FULL.md §4.7: malformed frames are reported
/// locally and never counted as a request).
pub fn handle_message(ctx: &DispatchContext, raw: &[u8]) -> Vec<u8> {
    let parsed = match parse_request(raw) {
        Ok(p) => p,
        Err(msg) => return serialize(&json!({ "error": msg })),
    };

    let start = Instant::now();
    let command = parsed.command;
    let samples = parsed.samples;
    let bytes_processed = samples.as_ref().map_or(0, |s| s.len() * std::mem::size_of::<Complex32>());

    let mut response = match dispatch_command(ctx, &command, &parsed.params, samples.as_deref()) {
        Ok(value) => value,
        Err(e) => json!({ "error": e.to_string(), "command": command }),
    };

    let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    if let Value::Object(ref mut map) = response {
        map.insert("processing_time_ms".into(), json!(processing_time_ms));
    }

    let success = response.get("error").is_none();
    ctx.stats.record_request(success, bytes_processed);
    if ctx.log_requests {
        tracing::info!(command = %command, success, processing_time_ms, "handled request");
    }

    serialize(&response)
}

fn serialize(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"failed to serialize response\"}".to_vec())
}

fn dispatch_command(
    ctx: &DispatchContext,
    command: &str,
    params: &Value,
    samples: Option<&[Complex32]>,
) -> Result<Value> {
    match command {
        "ping" => Ok(handle_ping(ctx)),
        "psd" => handle_psd(ctx, require_iq(samples)?, params),
        "fam" => handle_fam(ctx, require_iq(samples)?, params),
        "wvd" => handle_wvd(ctx, require_iq(samples)?, params),
        "cwd" => handle_cwd(ctx, require_iq(samples)?, params),
        "rf_dna" => handle_rf_dna(require_iq(samples)?, params),
        "cumulants" => handle_cumulants(require_iq(samples)?, params),
        "memory" => Ok(handle_memory(ctx)),
        "cleanup" => Ok(handle_cleanup(ctx)),
        "stats" => Ok(ctx.stats.snapshot()),
        other => Err(ServiceError::UnknownCommand(other.to_string())),
    }
}

fn require_iq(samples: Option<&[Complex32]>) -> Result<&[Complex32]> {
    samples.ok_or(ServiceError::MissingIq)
}

fn handle_ping(ctx: &DispatchContext) -> Value {
    json!({
        "status": "ok",
        "gpu_available": ctx.backend.is_gpu(),
        "memory_used_bytes": ctx.backend.memory_used_bytes(),
        "stats": ctx.stats.snapshot(),
    })
}

fn handle_psd(ctx: &DispatchContext, samples: &[Complex32], params: &Value) -> Result<Value> {
    let fft_size = param_u64(params, "fft_size", 1024) as usize;
    let overlap = param_f64(params, "overlap", 0.5) as f32;
    let window = WindowKind::parse(param_str(params, "window", "hann"))?;
    let psd = psd_welch(ctx.backend, samples, fft_size, overlap, window, true)?;
    Ok(json!({
        "psd": psd,
        "fft_size": fft_size,
        "num_bins": psd.len(),
    }))
}

/// Shared by the JSON `fam` handler and, behind the `arrow-transport`
/// feature, the Arrow IPC response path (see `arrow_transport`).
pub fn compute_fam(
    ctx: &DispatchContext,
    samples: &[Complex32],
    params: &Value,
) -> Result<rf_kernels::FamResult> {
    let sample_rate = param_f64(params, "sample_rate", 1.0e6);
    let nfft = param_u64(params, "nfft", 256) as usize;
    let overlap = param_f64(params, "overlap", 0.5) as f32;
    let alpha_max = param_f64(params, "alpha_max", 0.5);
    let window = WindowKind::parse(param_str(params, "window", "hann"))?;
    Ok(fam_scf(ctx.backend, samples, sample_rate, nfft, overlap, alpha_max, window)?)
}

fn handle_fam(ctx: &DispatchContext, samples: &[Complex32], params: &Value) -> Result<Value> {
    let result = compute_fam(ctx, samples, params)?;
    Ok(json!({
        "scf_magnitude": result.scf_magnitude,
        "spectral_freqs": result.spectral_freqs,
        "cyclic_freqs": result.cyclic_freqs,
        "cyclic_profile": result.cyclic_profile,
        "shape": result.shape,
    }))
}

/// `true` if this request asks for the Arrow IPC response path rather than
/// JSON (`params.format == "arrow"`, only meaningful for `fam`).
pub fn wants_arrow_format(params: &Value) -> bool {
    param_str(params, "format", "json") == "arrow"
}

fn handle_wvd(ctx: &DispatchContext, samples: &[Complex32], params: &Value) -> Result<Value> {
    let nfft = param_u64(params, "nfft", 256) as usize;
    let num_time_points = param_opt_u64(params, "num_time_points").map(|v| v as usize);
    let smoothing = param_bool(params, "smoothing", false);
    let smooth_window = param_u64(params, "smooth_window", 16) as usize;
    let result = wigner_ville(ctx.backend, samples, nfft, num_time_points, smoothing, smooth_window)?;
    Ok(json!({
        "wvd": result.magnitude,
        "time_axis": result.time_axis,
        "freq_axis": result.freq_axis,
        "shape": result.shape,
    }))
}

fn handle_cwd(ctx: &DispatchContext, samples: &[Complex32], params: &Value) -> Result<Value> {
    let nfft = param_u64(params, "nfft", 256) as usize;
    let sigma = param_f64(params, "sigma", 1.0);
    let num_time_points = param_opt_u64(params, "num_time_points").map(|v| v as usize);
    let result = choi_williams(ctx.backend, samples, nfft, sigma, num_time_points)?;
    Ok(json!({
        "cwd": result.magnitude,
        "time_axis": result.time_axis,
        "freq_axis": result.freq_axis,
        "shape": result.shape,
    }))
}

fn handle_rf_dna(samples: &[Complex32], params: &Value) -> Result<Value> {
    let regions = param_u64(params, "regions", 20) as usize;
    let features = rf_dna_features(samples, regions)?;
    Ok(json!({
        "features": features,
        "feature_count": features.len(),
        "regions": regions,
    }))
}

fn handle_cumulants(samples: &[Complex32], params: &Value) -> Result<Value> {
    let orders: Vec<u32> = params
        .get("orders")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_u64).map(|v| v as u32).collect())
        .unwrap_or_else(|| vec![4, 6]);
    let result = higher_order_cumulants(samples, &orders);
    Ok(json!({
        "cum4": result.cum4,
        "cum6": result.cum6,
    }))
}

fn handle_memory(ctx: &DispatchContext) -> Value {
    json!({
        "gpu_available": ctx.backend.is_gpu(),
        "used_bytes": ctx.backend.memory_used_bytes(),
        "total_bytes": ctx.backend.memory_capacity_bytes(),
        "utilization": ctx.backend.memory_utilization(),
    })
}

fn handle_cleanup(ctx: &DispatchContext) -> Value {
    ctx.backend.cleanup();
    json!({ "status": "ok", "message": "memory cleared" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_backend::CpuBackend;

    fn context(backend: &CpuBackend, cache: &MatchedFilterCache, stats: &ServiceStats) -> DispatchContext<'_> {
        DispatchContext {
            backend,
            filter_cache: cache,
            stats,
            log_requests: false,
        }
    }

    #[test]
    fn ping_reports_ok_and_counts_as_success() {
        let backend = CpuBackend::default();
        let cache = MatchedFilterCache::new();
        let stats = ServiceStats::new();
        let ctx = context(&backend, &cache, &stats);
        let response = handle_message(&ctx, br#"{"command":"ping"}"#);
        let value: Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(value["status"], "ok");
        assert!(value["processing_time_ms"].is_number());
        assert_eq!(value["stats"]["requests_total"], 0);
        assert_eq!(stats.snapshot()["requests_total"], 1);
    }

    #[test]
    fn unknown_command_is_reported_as_failure() {
        let backend = CpuBackend::default();
        let cache = MatchedFilterCache::new();
        let stats = ServiceStats::new();
        let ctx = context(&backend, &cache, &stats);
        let response = handle_message(&ctx, br#"{"command":"blorp"}"#);
        let value: Value = serde_json::from_slice(&response).unwrap();
        assert!(value["error"].is_string());
        assert_eq!(stats.snapshot()["requests_failed"], 1);
    }

    #[test]
    fn psd_without_iq_is_a_missing_iq_error_not_a_parse_failure() {
        let backend = CpuBackend::default();
        let cache = MatchedFilterCache::new();
        let stats = ServiceStats::new();
        let ctx = context(&backend, &cache, &stats);
        let response = handle_message(&ctx, br#"{"command":"psd","params":{}}"#);
        let value: Value = serde_json::from_slice(&response).unwrap();
        assert!(value["error"].is_string());
        assert!(value["processing_time_ms"].is_number());
        assert_eq!(stats.snapshot()["requests_failed"], 1);
    }

    #[test]
    fn invalid_json_never_touches_stats() {
        let backend = CpuBackend::default();
        let cache = MatchedFilterCache::new();
        let stats = ServiceStats::new();
        let ctx = context(&backend, &cache, &stats);
        let response = handle_message(&ctx, b"not json at all");
        let value: Value = serde_json::from_slice(&response).unwrap();
        assert!(value["error"].as_str().unwrap().starts_with("Invalid JSON"));
        assert!(value.get("processing_time_ms").is_none());
        assert_eq!(stats.snapshot()["requests_total"], 0);
    }

    #[test]
    fn psd_with_iq_returns_expected_bin_count() {
        let backend = CpuBackend::default();
        let cache = MatchedFilterCache::new();
        let stats = ServiceStats::new();
        let ctx = context(&backend, &cache, &stats);
        let n = 2048;
        let iq_real: Vec<f32> = (0..n).map(|i| (i as f32 * 0.1).cos()).collect();
        let iq_imag: Vec<f32> = (0..n).map(|i| (i as f32 * 0.1).sin()).collect();
        let request = json!({
            "command": "psd",
            "params": { "fft_size": 256 },
            "iq_real": iq_real,
            "iq_imag": iq_imag,
        });
        let response = handle_message(&ctx, &serde_json::to_vec(&request).unwrap());
        let value: Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(value["num_bins"], 256);
        assert_eq!(stats.snapshot()["requests_success"], 1);
    }
}
