use crate::{
    audio::{AudioClips, AUDIO_ROUTE},
    catalog::SignCatalog,
    config::{Config, WebConfig},
    routes::api_routes,
    slot::LatestDetection,
    stream::PipelineStatus,
    telemetry::Metrics,
};
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use bytes::Bytes;
use std::sync::Arc;
use tokio::{
    net::TcpListener,
    sync::broadcast::{self, Receiver},
    task::JoinHandle,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

#[derive(Clone)]
pub struct SharedState {
    pub latest_detection: Arc<LatestDetection>,
    pub frames: broadcast::Sender<Bytes>,
    /// Ends open `/video_feed` bodies so graceful shutdown can complete.
    pub shutdown: broadcast::Sender<()>,
    pub catalog: Arc<SignCatalog>,
    pub audio: AudioClips,
    pub status: Arc<PipelineStatus>,
    pub metrics: Arc<Metrics>,
}

pub fn build_router(state: SharedState, web_config: &WebConfig) -> anyhow::Result<Router> {
    let origin = web_config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            anyhow::anyhow!("invalid allowed origin {:?}: {}", web_config.allowed_origin, e)
        })?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let audio_dir = state.audio.dir().to_path_buf();

    let router = Router::new()
        .merge(api_routes())
        .nest_service(AUDIO_ROUTE, ServeDir::new(audio_dir))
        .nest_service("/static", ServeDir::new(&web_config.static_dir))
        .with_state(state)
        .layer(cors);

    Ok(router)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(state: SharedState, config: &Config) -> anyhow::Result<Self> {
        let addr = config.server.get_address();

        let metrics_layer = HttpMetricsLayerBuilder::new().build();
        let router = build_router(state, &config.web)?.layer(metrics_layer);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        mut shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            Ok::<(), anyhow::Error>(())
        });

        Ok(server_handle)
    }
}
