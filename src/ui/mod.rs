//! Desktop shell for tabweave.
//!
//! Uses `tao` for the window and event loop and `wry` for native child
//! webviews, one per bound tab:
//! - Windows: WebView2
//! - Linux: WebKitGTK
//! - macOS: WKWebView
//!
//! A thin chrome webview across the top renders the tab strip from coordinator
//! snapshots and posts user actions back through wry IPC.

pub mod webview_app;
