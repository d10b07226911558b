use crate::{
    audio::AudioClips,
    camera::{Camera, FrameSource},
    catalog::SignCatalog,
    config::Config,
    model::OrtSignModel,
    prediction::SignDetector,
    server::{HttpServer, SharedState},
    slot::LatestDetection,
    stream::{PipelineStatus, StreamingLoop},
    telemetry::Metrics,
};

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let camera = match Camera::open(&config.camera) {
        Ok(camera) => camera,
        Err(e) => {
            tracing::error!("Failed to initialize camera: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let catalog = Arc::new(SignCatalog::gtsrb());

    let detector = match OrtSignModel::new(&config.detector) {
        Ok(model) => Some(SignDetector::new(model, catalog.clone(), &config.detector)),
        Err(e) => {
            tracing::error!("Failed to initialize detector, streaming without detection: {:?}", e);
            None
        }
    };

    let metrics = Arc::new(Metrics::new()?);
    let latest_detection = Arc::new(LatestDetection::new());
    let status = Arc::new(PipelineStatus::new(camera.is_opened(), detector.is_some()));
    let (frames_tx, _) = broadcast::channel(config.camera.frame_queue_size.max(1));
    let (shutdown_tx, _) = broadcast::channel(1);

    let state = SharedState {
        latest_detection: latest_detection.clone(),
        frames: frames_tx.clone(),
        shutdown: shutdown_tx.clone(),
        catalog,
        audio: AudioClips::new(&config.web.audio_dir),
        status: status.clone(),
        metrics: metrics.clone(),
    };

    let server = HttpServer::new(state, &config).await?;

    let server_shutdown_rx = shutdown_tx.subscribe();
    let loop_shutdown_rx = shutdown_tx.subscribe();

    let streaming_loop = StreamingLoop::new(
        camera,
        detector,
        latest_detection,
        frames_tx,
        status,
        metrics,
    );
    let loop_handle = tokio::task::spawn_blocking(move || streaming_loop.run(loop_shutdown_rx));

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    if let Err(e) = server_handle.await {
        tracing::error!("Server task failed: {:?}", e);
    }
    if let Err(e) = loop_handle.await {
        tracing::error!("Streaming loop failed: {:?}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
