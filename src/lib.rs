pub mod config;
pub mod filter;
pub mod history;
pub mod plot;
pub mod queue;
pub mod render;
pub mod sensor;
pub mod session;
pub mod store;
pub mod types;

pub use config::VisualizerConfig;
pub use filter::HighpassFilter;
pub use history::HistoryWindow;
pub use plot::PngRenderer;
pub use queue::{sample_queue, SampleQueue, SampleSender};
pub use render::{
    draw_frame, Color, LineStyle, RenderError, RenderLoop, Renderer, TextAlign, TextStyle,
};
pub use sensor::SensorFeed;
pub use session::{launch, Session, SessionController, SessionState};
pub use store::{CsvGraphStore, GraphStore, MemoryGraphStore, RowId, StoreError};
pub use types::{now_ms, Axis, Sample};
