#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod colors;
mod constants;
mod export;
mod ui;
mod viewport;

use clap::Parser;
use color_eyre::eyre::eyre;
use constants::{ERROR_TOAST_SECONDS, INFO_TOAST_SECONDS};
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use svviz_view::client::{ClientEvent, HttpBackend, PollingClient};
use svviz_view::config::Config;
use svviz_view::render::SvgRenderer;
use svviz_view::snapshot::Snapshot;
use svviz_view::{Category, CountTable};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use viewport::CategoryView;

/// Native viewer for svviz read alignments
#[derive(Parser, Debug)]
#[command(name = "svviz-view", version)]
struct Args {
    /// Base URL of the svviz backend (overrides the config file)
    #[arg(long)]
    server: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show a snapshot written by `fetch_results` instead of polling a backend
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Delay between status polls in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Write the effective configuration back to the config file before starting
    #[arg(long)]
    save_config: bool,
}

/// What the status bar reports about the backend.
enum LoadStatus {
    /// Waiting for the backend to finish rendering.
    Waiting { attempts: usize, state: Option<String> },
    Loaded,
    /// Showing a snapshot file; no backend.
    Snapshot(PathBuf),
    /// No backend could be reached or configured.
    Offline(String),
}

/// Detail text for the last hovered read.
struct ReadDetail {
    read_id: String,
    text: String,
}

/// UI choices restored across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct ViewerState {
    selected: Category,
    show_counts: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            selected: Category::Alt,
            show_counts: true,
        }
    }
}

/// Main application state for the svviz viewer.
pub struct SvvizViewApp {
    config: Config,
    runtime: tokio::runtime::Runtime,
    client: Option<PollingClient<HttpBackend>>,
    events: UnboundedReceiver<ClientEvent>,
    renderer: SvgRenderer,
    status: LoadStatus,
    state: ViewerState,
    views: HashMap<Category, CategoryView>,
    counts: CountTable,
    detail: Option<ReadDetail>,
    hovered_read: Option<String>,
    pdf_export: bool,
    toasts: Toasts,
}

impl SvvizViewApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        snapshot: Option<PathBuf>,
        runtime: tokio::runtime::Runtime,
    ) -> Self {
        let toasts = Toasts::new()
            .anchor(egui::Align2::RIGHT_TOP, (-10.0, 10.0))
            .direction(egui::Direction::TopDown);

        let state: ViewerState = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let (tx, events) = mpsc::unbounded_channel();

        let mut app = Self {
            config,
            runtime,
            client: None,
            events,
            renderer: SvgRenderer::new(),
            status: LoadStatus::Offline("not connected".to_string()),
            state,
            views: HashMap::new(),
            counts: CountTable::new(),
            detail: None,
            hovered_read: None,
            pdf_export: false,
            toasts,
        };

        if let Some(path) = snapshot {
            match Snapshot::load(&path) {
                Ok(snapshot) => {
                    log::info!(
                        "Loaded snapshot of {} with {} fragments",
                        snapshot.server,
                        snapshot.fragment_count()
                    );
                    for (category, fragments) in snapshot.fragments {
                        let _ = tx.send(ClientEvent::Fragments {
                            category,
                            fragments,
                        });
                    }
                    let _ = tx.send(ClientEvent::Counts(snapshot.counts));
                    app.status = LoadStatus::Snapshot(path);
                }
                Err(err) => {
                    app.error_toast(err.to_string());
                    app.status = LoadStatus::Offline(err.to_string());
                }
            }
            return app;
        }

        match HttpBackend::new(&app.config.server, app.config.request_timeout()) {
            Ok(backend) => {
                let ctx = cc.egui_ctx.clone();
                let client = PollingClient::new(
                    backend,
                    app.config.categories.clone(),
                    tx,
                    move || ctx.request_repaint(),
                );

                let poller = client.clone();
                let interval = app.config.poll_interval();
                app.runtime.spawn(async move {
                    poller.poll_until_ready(interval).await;
                });

                let capability = client.clone();
                app.runtime.spawn(async move {
                    capability.check_pdf_export().await;
                });

                log::info!("Polling {} for results", app.config.server);
                app.status = LoadStatus::Waiting {
                    attempts: 0,
                    state: None,
                };
                app.client = Some(client);
            }
            Err(err) => {
                app.error_toast(err.to_string());
                app.status = LoadStatus::Offline(err.to_string());
            }
        }

        app
    }

    fn error_toast(&mut self, text: String) {
        self.toasts.add(Toast {
            kind: ToastKind::Error,
            text: text.into(),
            options: ToastOptions::default()
                .duration_in_seconds(ERROR_TOAST_SECONDS)
                .show_icon(true),
            ..Default::default()
        });
    }

    fn info_toast(&mut self, text: String) {
        self.toasts.add(Toast {
            kind: ToastKind::Info,
            text: text.into(),
            options: ToastOptions::default()
                .duration_in_seconds(INFO_TOAST_SECONDS)
                .show_icon(true),
            ..Default::default()
        });
    }

    /// Applies every event the client delivered since the last frame.
    fn poll_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ClientEvent::Progress { attempt, state } => {
                    self.status = LoadStatus::Waiting {
                        attempts: attempt,
                        state: Some(state),
                    };
                }
                ClientEvent::Fragments {
                    category,
                    fragments,
                } => {
                    let (view, failures) = CategoryView::from_fragments(&self.renderer, fragments);
                    for (name, message) in failures {
                        self.error_toast(format!("{name} ({category}): {message}"));
                    }
                    self.views.insert(category, view);
                    if !matches!(self.status, LoadStatus::Snapshot(_)) {
                        self.status = LoadStatus::Loaded;
                    }
                }
                ClientEvent::Counts(counts) => self.counts = counts,
                ClientEvent::Detail { read_id, text } => {
                    self.detail = Some(ReadDetail { read_id, text });
                }
                ClientEvent::PdfExport(available) => self.pdf_export = available,
                ClientEvent::Failed { what, message } => {
                    self.error_toast(format!("Failed to load {what}: {message}"));
                }
            }
        }
    }

    /// Starts a detail lookup when the pointer moves onto a different read.
    fn hover_read(&mut self, read_id: Option<String>) {
        if read_id == self.hovered_read {
            return;
        }
        self.hovered_read = read_id.clone();

        let (Some(read_id), Some(client)) = (read_id, &self.client) else {
            return;
        };
        let client = client.clone();
        self.runtime.spawn(async move {
            client.lookup_detail(read_id).await;
        });
    }

    fn selected_view_mut(&mut self) -> Option<&mut CategoryView> {
        self.views.get_mut(&self.state.selected)
    }
}

impl eframe::App for SvvizViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.handle_keyboard_input(ctx);

        self.show_status_bar(ctx);
        self.show_sidebar(ctx);
        self.show_central_panel(ctx);

        self.toasts.show(ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.state);
    }
}

fn main() -> color_eyre::Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    config.override_with(args.server, args.poll_interval_ms);

    if args.save_config {
        let path = args
            .config
            .clone()
            .or_else(Config::default_path)
            .ok_or_else(|| eyre!("no config directory to save into; pass --config"))?;
        config.save(&path)?;
        log::info!("Saved config to {}", path.display());
    }

    let runtime = tokio::runtime::Runtime::new()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    let snapshot = args.snapshot;
    eframe::run_native(
        "svviz",
        options,
        Box::new(move |cc| Ok(Box::new(SvvizViewApp::new(cc, config, snapshot, runtime)))),
    )
    .map_err(|err| eyre!("failed to run viewer: {err}"))
}
