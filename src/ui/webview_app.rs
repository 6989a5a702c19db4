//! `tao` + `wry` implementation of [`SurfaceHost`] and the window that hosts it.
//!
//! Webviews are not `Send`, so they live on the event-loop thread. The
//! coordinator talks to them through [`WryHost`], which forwards each
//! primitive as a user event and waits for the loop to reply.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tao::dpi::LogicalSize;
use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use tao::window::{Window, WindowBuilder};
use tokio::sync::{broadcast, oneshot};
use wry::{Rect, WebContext, WebView, WebViewBuilder};

use crate::app::App;
use crate::command::{parse_command, Command};
use crate::gateway::memory::InMemoryGateway;
use crate::host::{partition_dir, SurfaceHost, SurfaceSpec};
use crate::platform;
use crate::runtime::CoordinatorHandle;
use crate::types::errors::SurfaceError;
use crate::types::event::UiEvent;
use crate::types::geometry::Region;
use crate::types::tab::TabId;

const CHROME_HEIGHT: f64 = 48.0;
const WINDOW_WIDTH: f64 = 1280.0;
const WINDOW_HEIGHT: f64 = 800.0;

const CHROME_HTML: &str = r#"<!DOCTYPE html><html><head><meta charset="UTF-8"><style>
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,"Segoe UI",sans-serif;background:#161b22;color:#e6edf3;height:48px;display:flex;align-items:center;gap:6px;padding:0 8px;user-select:none}
#tabs{display:flex;gap:4px;overflow:hidden;flex:1}
.tab{padding:6px 10px;border-radius:6px;background:#21262d;max-width:180px;white-space:nowrap;overflow:hidden;text-overflow:ellipsis;cursor:default}
.tab.active{background:#1f6feb}
.tab.frozen,.tab.discarded{opacity:.55}
input{width:320px;padding:6px 10px;border-radius:6px;border:1px solid #30363d;background:#0d1117;color:inherit}
button{background:none;border:none;color:inherit;font-size:16px;padding:0 6px}
</style></head><body>
<button data-m="nav.back">&#8592;</button><button data-m="nav.forward">&#8594;</button><button data-m="nav.reload">&#8635;</button>
<div id="tabs"></div><button data-m="tabs.new">+</button>
<input id="omnibox" placeholder="Search or enter address">
<script>
function send(method,params){window.ipc.postMessage(JSON.stringify({method:method,params:params||{}}))}
document.querySelectorAll('button[data-m]').forEach(function(b){b.onclick=function(){send(b.dataset.m)}});
document.getElementById('omnibox').addEventListener('keydown',function(e){
  if(e.key==='Enter'&&e.target.value.trim()){send('nav.submit',{text:e.target.value.trim(),modifiers:{accel:e.ctrlKey||e.metaKey,shift:e.shiftKey,alt:e.altKey}})}
});
var hover=null;
function over(target,key){if(hover!==key){hover=key;send('drag.hover',{target:target})}}
var strip=document.getElementById('tabs');
strip.ondragover=function(e){e.preventDefault();over({kind:'list_end'},'end')};
strip.ondrop=function(e){e.preventDefault();send('drag.drop',{target:{kind:'list_end'}})};
window.__tw_render=function(s){
  strip.innerHTML='';
  s.tabs.forEach(function(t,i){
    var d=document.createElement('div');
    d.className='tab '+t.state+(t.id===s.active_id?' active':'');
    d.textContent=t.title||t.url||'New Tab';
    d.draggable=true;
    d.onclick=function(){send('tabs.activate',{tab_id:t.id})};
    d.onauxclick=function(e){if(e.button===1)send('tabs.close',{tab_id:t.id})};
    d.ondragstart=function(e){hover=null;e.dataTransfer.setData('text/plain',t.id);send('drag.begin',{tab_id:t.id})};
    d.ondragover=function(e){e.preventDefault();e.stopPropagation();over({kind:'tab',index:i},i)};
    d.ondrop=function(e){e.preventDefault();e.stopPropagation();send('drag.drop',{target:{kind:'tab',index:i}})};
    d.ondragend=function(e){hover=null;send('drag.end',{pointer:{x:e.screenX,y:e.screenY},window:{x:window.screenX,y:window.screenY,width:window.outerWidth,height:window.outerHeight}})};
    strip.appendChild(d);
  });
};
send('tabs.refresh');
</script></body></html>"#;

/// One host primitive, executed on the event-loop thread.
#[derive(Debug)]
enum SurfaceCall {
    Create(SurfaceSpec),
    Close(TabId),
    Show(TabId),
    Navigate { tab_id: TabId, url: String },
    Bounds(Region),
    Script { tab_id: TabId, js: &'static str },
}

enum UserEvent {
    Surface {
        call: SurfaceCall,
        reply: oneshot::Sender<Result<(), SurfaceError>>,
    },
    Ui(UiEvent),
}

/// [`SurfaceHost`] backed by native child webviews of one `tao` window.
pub struct WryHost {
    proxy: Mutex<EventLoopProxy<UserEvent>>,
}

impl WryHost {
    async fn call(&self, call: SurfaceCall) -> Result<(), SurfaceError> {
        let (reply, rx) = oneshot::channel();
        {
            let proxy = self
                .proxy
                .lock()
                .map_err(|_| SurfaceError::Host("event loop proxy poisoned".to_string()))?;
            proxy
                .send_event(UserEvent::Surface { call, reply })
                .map_err(|_| SurfaceError::Host("event loop closed".to_string()))?;
        }
        rx.await
            .map_err(|_| SurfaceError::Host("event loop dropped the request".to_string()))?
    }
}

#[async_trait]
impl SurfaceHost for WryHost {
    async fn create_webview(&self, spec: SurfaceSpec) -> Result<(), SurfaceError> {
        self.call(SurfaceCall::Create(spec)).await
    }

    async fn close_webview(&self, tab_id: &str) -> Result<(), SurfaceError> {
        self.call(SurfaceCall::Close(tab_id.to_string())).await
    }

    async fn show_webview(&self, tab_id: &str) -> Result<(), SurfaceError> {
        self.call(SurfaceCall::Show(tab_id.to_string())).await
    }

    async fn navigate_webview(&self, tab_id: &str, url: &str) -> Result<(), SurfaceError> {
        self.call(SurfaceCall::Navigate {
            tab_id: tab_id.to_string(),
            url: url.to_string(),
        })
        .await
    }

    async fn update_all_webview_bounds(&self, bounds: Region) -> Result<(), SurfaceError> {
        self.call(SurfaceCall::Bounds(bounds)).await
    }

    async fn webview_back(&self, tab_id: &str) -> Result<(), SurfaceError> {
        self.script(tab_id, "history.back();").await
    }

    async fn webview_forward(&self, tab_id: &str) -> Result<(), SurfaceError> {
        self.script(tab_id, "history.forward();").await
    }

    async fn reload_webview(&self, tab_id: &str) -> Result<(), SurfaceError> {
        self.script(tab_id, "location.reload();").await
    }

    async fn force_reload_webview(&self, tab_id: &str) -> Result<(), SurfaceError> {
        // Firefox honours the flag; other engines treat it as a plain reload.
        self.script(tab_id, "location.reload(true);").await
    }

    async fn stop_webview_loading(&self, tab_id: &str) -> Result<(), SurfaceError> {
        self.script(tab_id, "window.stop();").await
    }
}

impl WryHost {
    async fn script(&self, tab_id: &str, js: &'static str) -> Result<(), SurfaceError> {
        self.call(SurfaceCall::Script {
            tab_id: tab_id.to_string(),
            js,
        })
        .await
    }
}

fn to_rect(region: Region) -> Rect {
    Rect {
        position: wry::dpi::Position::Logical(wry::dpi::LogicalPosition::new(region.x, region.y)),
        size: wry::dpi::Size::Logical(wry::dpi::LogicalSize::new(region.width, region.height)),
    }
}

/// Webviews and storage contexts owned by the event-loop thread.
struct Surfaces {
    views: HashMap<TabId, WebView>,
    contexts: HashMap<String, WebContext>,
    bounds: Region,
}

impl Surfaces {
    fn apply(&mut self, window: &Window, call: SurfaceCall) -> Result<(), SurfaceError> {
        match call {
            SurfaceCall::Create(spec) => {
                if self.views.contains_key(&spec.tab_id) {
                    return Ok(());
                }
                let data_dir = partition_dir(&platform::get_data_dir(), &spec.partition);
                let context = self
                    .contexts
                    .entry(spec.partition.clone())
                    .or_insert_with(|| WebContext::new(Some(data_dir)));
                let bounds = if spec.bounds.is_degenerate() {
                    self.bounds
                } else {
                    spec.bounds
                };
                let view = WebViewBuilder::new_with_web_context(context)
                    .with_url(&spec.url)
                    .with_bounds(to_rect(bounds))
                    .with_visible(false)
                    .with_devtools(cfg!(debug_assertions))
                    .build_as_child(window)
                    .map_err(|e| SurfaceError::CreateFailed {
                        tab_id: spec.tab_id.clone(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(tab_id = %spec.tab_id, partition = %spec.partition, "webview created");
                self.views.insert(spec.tab_id, view);
                Ok(())
            }
            SurfaceCall::Close(tab_id) => {
                if self.views.remove(&tab_id).is_some() {
                    tracing::debug!(tab_id = %tab_id, "webview closed");
                }
                Ok(())
            }
            SurfaceCall::Show(tab_id) => {
                if !self.views.contains_key(&tab_id) {
                    return Err(SurfaceError::NotBound(tab_id));
                }
                for (id, view) in &self.views {
                    view.set_visible(*id == tab_id)
                        .map_err(|e| SurfaceError::ShowFailed {
                            tab_id: id.clone(),
                            reason: e.to_string(),
                        })?;
                }
                Ok(())
            }
            SurfaceCall::Navigate { tab_id, url } => {
                let view = self
                    .views
                    .get(&tab_id)
                    .ok_or_else(|| SurfaceError::NotBound(tab_id.clone()))?;
                view.load_url(&url)
                    .map_err(|e| SurfaceError::NavigateFailed {
                        tab_id,
                        reason: e.to_string(),
                    })
            }
            SurfaceCall::Bounds(region) => {
                self.bounds = region;
                for view in self.views.values() {
                    view.set_bounds(to_rect(region))
                        .map_err(|e| SurfaceError::Host(e.to_string()))?;
                }
                Ok(())
            }
            SurfaceCall::Script { tab_id, js } => {
                let view = self
                    .views
                    .get(&tab_id)
                    .ok_or_else(|| SurfaceError::NotBound(tab_id.clone()))?;
                view.evaluate_script(js)
                    .map_err(|e| SurfaceError::Host(e.to_string()))
            }
        }
    }
}

fn content_region(width: f64, height: f64) -> Region {
    Region::new(0.0, CHROME_HEIGHT, width, (height - CHROME_HEIGHT).max(0.0))
}

fn forward_events(handle: &CoordinatorHandle, proxy: EventLoopProxy<UserEvent>) {
    let mut events = handle.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if proxy.send_event(UserEvent::Ui(event)).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "chrome fell behind on ui events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn dispatch_ipc(handle: &CoordinatorHandle, body: &str) {
    let request: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "malformed chrome message");
            return;
        }
    };
    let method = request.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = request
        .get("params")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    match parse_command(method, &params) {
        Ok(command) => {
            if let Err(e) = handle.post(command) {
                tracing::warn!(error = %e, method = %method, "coordinator unavailable");
            }
        }
        Err(e) => tracing::warn!(error = %e, "rejected chrome message"),
    }
}

/// Opens the window and runs the coordinator until it is closed.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let window = WindowBuilder::new()
        .with_title("tabweave")
        .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .build(&event_loop)?;

    let mut app = match App::new(None) {
        Ok(app) => app,
        Err(e) => {
            tracing::warn!(error = %e, "settings unreadable, using defaults");
            App::with_settings(Default::default())
        }
    };
    let new_tab_url = app.settings().navigation.new_tab_url.clone();
    let gateway = Arc::new(InMemoryGateway::with_tabs(&[new_tab_url.as_str()]));
    let host = Arc::new(WryHost {
        proxy: Mutex::new(proxy.clone()),
    });
    let handle = {
        let _guard = runtime.enter();
        let handle = app.startup(gateway, host);
        forward_events(&handle, proxy);
        handle
    };

    let ipc_handle = handle.clone();
    let chrome = WebViewBuilder::new()
        .with_html(CHROME_HTML)
        .with_bounds(to_rect(Region::new(0.0, 0.0, WINDOW_WIDTH, CHROME_HEIGHT)))
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            dispatch_ipc(&ipc_handle, msg.body());
        })
        .build_as_child(&window)?;

    let initial = content_region(WINDOW_WIDTH, WINDOW_HEIGHT);
    let mut surfaces = Surfaces {
        views: HashMap::new(),
        contexts: HashMap::new(),
        bounds: initial,
    };
    if let Err(e) = handle.post(Command::SyncBounds { region: initial }) {
        tracing::warn!(error = %e, "initial bounds not delivered");
    }

    let mut app = Some(app);
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                if let Some(mut app) = app.take() {
                    runtime.block_on(app.shutdown());
                }
                *control_flow = ControlFlow::Exit;
            }

            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                let logical = size.to_logical::<f64>(window.scale_factor());
                let _ = chrome.set_bounds(to_rect(Region::new(
                    0.0,
                    0.0,
                    logical.width,
                    CHROME_HEIGHT,
                )));
                if let Err(e) =
                    handle.request_bounds(content_region(logical.width, logical.height))
                {
                    tracing::warn!(error = %e, "dropping resize");
                }
                let _ = handle.post(Command::FlushBounds);
            }

            Event::UserEvent(UserEvent::Surface { call, reply }) => {
                let result = surfaces.apply(&window, call);
                let _ = reply.send(result);
            }

            Event::UserEvent(UserEvent::Ui(event)) => {
                if let UiEvent::SnapshotUpdated(snapshot) = &event {
                    match serde_json::to_string(snapshot) {
                        Ok(json) => {
                            let _ = chrome.evaluate_script(&format!(
                                "window.__tw_render&&window.__tw_render({})",
                                json
                            ));
                        }
                        Err(e) => tracing::warn!(error = %e, "snapshot not serializable"),
                    }
                }
            }

            _ => {}
        }
    });
}
