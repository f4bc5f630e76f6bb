//! Application screens

mod channel_viewer;

pub use channel_viewer::ChannelViewerScreen;
