use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rf_backend::{Backend, CpuBackend};
use rf_kernels::matched_filter::MatchedFilterCache;
use rf_service::{cleanup, transport, DispatchContext, ServiceConfig, ServiceStats};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Intercepts `fam` requests asking for `params.format == "arrow"` and
/// serves them over the Arrow IPC path instead of JSON (SPEC_FULL.md
/// §4.6.1). Returns `true` if it handled (and responded to) the request.
#[cfg(feature = "arrow-transport")]
fn try_serve_arrow_fam(ctx: &DispatchContext, stream: &mut std::net::TcpStream, frame: &[u8]) -> bool {
    use rf_service::arrow_transport::{encode_fam_arrow, write_typed_frame, CONTENT_TYPE_ARROW};
    use rf_service::dispatch::{compute_fam, wants_arrow_format};

    let parsed = match rf_service::dispatch::parse_request(frame) {
        Ok(p) => p,
        Err(_) => return false,
    };
    if parsed.command != "fam" || !wants_arrow_format(&parsed.params) {
        return false;
    }
    let Some(samples) = parsed.samples.as_deref() else {
        return false;
    };
    match compute_fam(ctx, samples, &parsed.params) {
        Ok(result) => match encode_fam_arrow(&result) {
            Ok(bytes) => {
                if let Err(e) = write_typed_frame(stream, CONTENT_TYPE_ARROW, &bytes) {
                    warn!(error = %e, "failed to write arrow response");
                }
                ctx.stats.record_request(true, samples.len() * std::mem::size_of::<num_complex::Complex32>());
            }
            Err(e) => warn!(error = %e, "failed to encode arrow response"),
        },
        Err(e) => warn!(error = %e, "fam computation failed for arrow response"),
    }
    true
}

fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".into());
    let config = ServiceConfig::load_or_default(&config_path).unwrap_or_else(|e| {
        eprintln!("failed to load config from {config_path}: {e}, using defaults");
        ServiceConfig::default()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let backend: Arc<dyn Backend> = Arc::new(CpuBackend::new(config.num_streams));
    let filter_cache = MatchedFilterCache::new();
    let stats = ServiceStats::new();
    let shutdown = Arc::new(AtomicBool::new(false));

    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            warn!("shutdown signal received");
            shutdown.store(true, Ordering::Relaxed);
        })
        .expect("failed to install signal handler");
    }

    let cleanup_handle = cleanup::spawn(
        backend.clone(),
        config.memory_cleanup_interval_secs,
        config.memory_cleanup_threshold,
        shutdown.clone(),
    );

    let listener = match TcpListener::bind(&config.bind_address) {
        Ok(l) => l,
        Err(e) => {
            error!(address = %config.bind_address, error = %e, "failed to bind");
            return;
        }
    };
    listener
        .set_nonblocking(true)
        .expect("failed to set listener non-blocking");
    info!(address = %config.bind_address, "listening");

    while !shutdown.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((mut stream, peer)) => {
                if let Err(e) = transport::configure_stream(&stream) {
                    warn!(%peer, error = %e, "failed to configure stream");
                    continue;
                }
                info!(%peer, "client connected");
                let ctx = DispatchContext {
                    backend: backend.as_ref(),
                    filter_cache: &filter_cache,
                    stats: &stats,
                    log_requests: config.log_requests,
                };
                loop {
                    match transport::read_frame(&mut stream) {
                        Ok(Some(frame)) => {
                            #[cfg(feature = "arrow-transport")]
                            if try_serve_arrow_fam(&ctx, &mut stream, &frame) {
                                continue;
                            }
                            let response = rf_service::handle_message(&ctx, &frame);
                            if let Err(e) = transport::write_frame(&mut stream, &response) {
                                warn!(%peer, error = %e, "failed to write response");
                                break;
                            }
                        }
                        Ok(None) => {
                            info!(%peer, "client disconnected");
                            break;
                        }
                        Err(e) => {
                            warn!(%peer, error = %e, "transport error");
                            break;
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
            Err(e) => {
                error!(error = %e, "accept failed");
            }
        }
    }

    info!("shutting down");
    backend.cleanup();
    shutdown.store(true, Ordering::Relaxed);
    let _ = cleanup_handle.join();
    info!("shutdown complete");
}
