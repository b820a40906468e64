//! Browser bindings
//!
//! `SecretGesture` watches a page element for the "7" and calls back into
//! JS on unlock. `PongGame` runs one game on a canvas until closed. The host
//! page owns the modal, the name prompt and every other piece of UI.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Element, Event, EventTarget, HtmlCanvasElement, HtmlElement,
    KeyboardEvent, MouseEvent, TouchEvent,
};

use super::device_kind_for;
use crate::audio::web::WebAudioBackend;
use crate::audio::{AudioEngine, DeviceKind};
use crate::consts::SIM_DT;
use crate::gesture::{
    EndReason, GestureOutcome, GestureSurface, OriginElement, RawPointer, SurfaceRect,
    SurfaceStyle,
};
use crate::highscores::LocalLeaderboard;
use crate::renderer::{CanvasPainter, Overlay, build_scene};
use crate::score::{Anonymous, AuthContext, PlayerIdentity, ScoreFlow, SignedIn};
use crate::session::GameSession;
use crate::settings::Settings;
use crate::sim::GamePhase;
use crate::unlock::UnlockOrchestrator;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
}

/// An event listener that unregisters itself when dropped
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

fn listen(
    target: &EventTarget,
    kind: &'static str,
    passive: bool,
    handler: impl FnMut(Event) + 'static,
) -> Result<Listener, JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    let options = AddEventListenerOptions::new();
    options.set_passive(passive);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        closure.as_ref().unchecked_ref(),
        &options,
    )?;
    Ok(Listener {
        target: target.clone(),
        kind,
        closure,
    })
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn element_by_id(id: &str) -> Result<Element, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element #{}", id)))
}

fn client_rect(el: &Element) -> SurfaceRect {
    let r = el.get_bounding_client_rect();
    SurfaceRect::new(r.left() as f32, r.top() as f32, r.width() as f32, r.height() as f32)
}

/// Mouse or touch position in viewport coordinates
fn raw_pointer(event: &Event) -> Option<RawPointer> {
    if let Some(touch) = event.dyn_ref::<TouchEvent>() {
        let list = touch.touches();
        let points = (0..list.length())
            .filter_map(|i| list.get(i))
            .map(|t| (t.client_x() as f32, t.client_y() as f32))
            .collect();
        return Some(RawPointer::Touch { points });
    }
    event.dyn_ref::<MouseEvent>().map(|m| RawPointer::Mouse {
        x: m.client_x() as f32,
        y: m.client_y() as f32,
    })
}

fn is_close_control(el: &Element) -> bool {
    el.has_attribute("data-close")
        || el
            .get_attribute("aria-label")
            .is_some_and(|label| label.eq_ignore_ascii_case("close"))
}

/// Elements from the event target up to (not including) the surface
fn origin_chain(event: &Event, surface: &Element) -> Vec<OriginElement> {
    let mut chain = Vec::new();
    let mut node = event.target().and_then(|t| t.dyn_into::<Element>().ok());
    while let Some(el) = node {
        if &el == surface {
            break;
        }
        chain.push(OriginElement {
            tag: el.tag_name().to_ascii_lowercase(),
            role: el.get_attribute("role"),
            close_control: is_close_control(&el),
        });
        node = el.parent_element();
    }
    chain
}

/// Turns off text selection and touch scrolling on the surface while drawing
struct CssSuppression {
    element: HtmlElement,
}

impl SurfaceStyle for CssSuppression {
    fn suppress_defaults(&mut self, on: bool) {
        let style = self.element.style();
        for prop in ["user-select", "-webkit-user-select", "touch-action"] {
            let result = if on {
                style.set_property(prop, "none")
            } else {
                style.remove_property(prop).map(|_| ())
            };
            if let Err(e) = result {
                log::debug!("Could not toggle {}: {:?}", prop, e);
            }
        }
    }
}

struct GestureInner {
    surface: GestureSurface<CssSuppression>,
    unlock: UnlockOrchestrator<Box<dyn FnMut()>>,
    element: Element,
}

impl GestureInner {
    /// Page may have scrolled or reflowed since the last stroke
    fn refresh_layout(&mut self) {
        let rect = client_rect(&self.element);
        self.surface.set_rect(rect);

        let mut zones = Vec::new();
        if let Ok(list) = self.element.query_selector_all("[data-close], [aria-label='Close']") {
            for i in 0..list.length() {
                let Some(el) = list.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                    continue;
                };
                let r = client_rect(&el);
                zones.push(SurfaceRect::new(
                    r.left - rect.left,
                    r.top - rect.top,
                    r.width,
                    r.height,
                ));
            }
        }
        self.surface.sampler_mut().set_close_zones(zones);
    }

    fn settle(&mut self, outcome: Option<GestureOutcome>) {
        if outcome == Some(GestureOutcome::Matched) {
            self.unlock.signal(js_sys::Date::now());
        }
    }
}

/// Hidden gesture detector bound to one page element
#[wasm_bindgen]
pub struct SecretGesture {
    inner: Rc<RefCell<GestureInner>>,
    _listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl SecretGesture {
    /// Watch `element_id`; `on_unlock` runs once per unlocked session
    #[wasm_bindgen(constructor)]
    pub fn new(element_id: &str, on_unlock: js_sys::Function) -> Result<SecretGesture, JsValue> {
        let element = element_by_id(element_id)?;
        let html: HtmlElement = element.clone().dyn_into()?;
        let settings = Settings::load();

        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let on_match: Box<dyn FnMut()> = Box::new(move || flag.set(true));
        let inner = Rc::new(RefCell::new(GestureInner {
            surface: GestureSurface::new(
                client_rect(&element),
                CssSuppression { element: html },
                settings.gesture,
            ),
            unlock: UnlockOrchestrator::new(on_match, settings.unlock_cooldown_ms),
            element: element.clone(),
        }));

        // JS runs after the borrow is released so it may call back in
        let notify = Rc::new(move || {
            if fired.replace(false) {
                if let Err(e) = on_unlock.call0(&JsValue::NULL) {
                    log::warn!("Unlock callback threw: {:?}", e);
                }
            }
        });

        let win: EventTarget = window()?.into();
        let target: &EventTarget = element.as_ref();
        let mut listeners = Vec::new();

        for kind in ["mousedown", "touchstart"] {
            let inner = inner.clone();
            listeners.push(listen(target, kind, true, move |e| {
                let mut g = inner.borrow_mut();
                g.refresh_layout();
                let Some(raw) = raw_pointer(&e) else {
                    return;
                };
                let chain = origin_chain(&e, &g.element);
                g.surface.pointer_down(&raw, &chain, e.time_stamp());
            })?);
        }

        for kind in ["mousemove", "touchmove"] {
            let inner = inner.clone();
            let notify = notify.clone();
            listeners.push(listen(&win, kind, false, move |e| {
                let mut g = inner.borrow_mut();
                if !g.surface.is_drawing() {
                    return;
                }
                let Some(raw) = raw_pointer(&e) else {
                    return;
                };
                if let RawPointer::Touch { .. } = raw {
                    e.prevent_default();
                    // Touch has no leave event; check the finger ourselves
                    let inside = raw
                        .primary()
                        .is_some_and(|p| g.surface.sampler().rect().contains(p));
                    if !inside {
                        let outcome = g.surface.pointer_leave();
                        g.settle(outcome);
                        drop(g);
                        notify();
                        return;
                    }
                }
                g.surface.pointer_move(&raw, e.time_stamp());
            })?);
        }

        {
            let inner = inner.clone();
            let notify = notify.clone();
            listeners.push(listen(target, "mouseleave", true, move |_e| {
                {
                    let mut g = inner.borrow_mut();
                    if g.surface.is_drawing() {
                        let outcome = g.surface.pointer_leave();
                        g.settle(outcome);
                    }
                }
                notify();
            })?);
        }

        for kind in ["mouseup", "touchend"] {
            let inner = inner.clone();
            let notify = notify.clone();
            listeners.push(listen(&win, kind, true, move |e| {
                {
                    let mut g = inner.borrow_mut();
                    if !g.surface.is_drawing() {
                        return;
                    }
                    // Lifting one of several fingers doesn't end the stroke
                    if let Some(touch) = e.dyn_ref::<TouchEvent>() {
                        if touch.touches().length() > 0 {
                            return;
                        }
                    }
                    let outcome = g.surface.pointer_up();
                    g.settle(outcome);
                }
                notify();
            })?);
        }

        {
            let inner = inner.clone();
            listeners.push(listen(&win, "touchcancel", true, move |_e| {
                inner.borrow_mut().surface.abort(EndReason::Cancelled);
            })?);
        }
        {
            let inner = inner.clone();
            listeners.push(listen(&win, "blur", true, move |_e| {
                inner.borrow_mut().surface.abort(EndReason::WindowBlur);
            })?);
        }

        log::info!("Secret gesture armed on #{}", element_id);
        Ok(SecretGesture {
            inner,
            _listeners: listeners,
        })
    }

    /// The game opened by the last unlock was dismissed
    #[wasm_bindgen(js_name = sessionClosed)]
    pub fn session_closed(&self) {
        self.inner.borrow_mut().unlock.session_closed();
    }

    #[wasm_bindgen(js_name = isSessionOpen)]
    pub fn is_session_open(&self) -> bool {
        self.inner.borrow().unlock.is_session_open()
    }
}

fn auth_from_js(value: &JsValue) -> Box<dyn AuthContext> {
    if value.is_null() || value.is_undefined() {
        return Box::new(Anonymous);
    }
    let field = |name: &str| {
        js_sys::Reflect::get(value, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_string())
    };
    match (field("userId"), field("displayName")) {
        (Some(user_id), display_name) => Box::new(SignedIn(PlayerIdentity {
            display_name: display_name.unwrap_or_else(|| user_id.clone()),
            user_id,
        })),
        _ => Box::new(Anonymous),
    }
}

/// Score flow as a plain object for the host UI
fn flow_to_js(flow: &ScoreFlow) -> JsValue {
    let obj = js_sys::Object::new();
    let set = |key: &str, value: JsValue| {
        let _ = js_sys::Reflect::set(&obj, &JsValue::from_str(key), &value);
    };
    match flow {
        ScoreFlow::Submitted { score } => {
            set("kind", "submitted".into());
            set("score", (*score).into());
        }
        ScoreFlow::NotQualified => set("kind", "notQualified".into()),
        ScoreFlow::NamePrompt { score, rank } => {
            set("kind", "namePrompt".into());
            set("score", (*score).into());
            set("rank", rank.map(|r| r as u32).into());
        }
        ScoreFlow::Skipped => set("kind", "skipped".into()),
        ScoreFlow::Failed(e) => {
            set("kind", "failed".into());
            set("message", e.to_string().into());
        }
        ScoreFlow::AlreadyHandled => set("kind", "alreadyHandled".into()),
    }
    obj.into()
}

struct GameInner {
    session: GameSession<WebAudioBackend>,
    painter: CanvasPainter,
    canvas: HtmlCanvasElement,
    settings: Settings,
    on_score: Option<js_sys::Function>,
    last_time: f64,
}

impl GameInner {
    fn render(&self) {
        let audio = self.session.audio();
        let overlay = Overlay {
            notice: self.session.notice(),
            audio_locked: audio.is_locked(),
            muted: audio.state().muted,
        };
        self.painter.paint(&build_scene(self.session.sim(), &overlay));
    }

    fn pointer_field_y(&self, event: &Event) -> Option<f32> {
        let raw = raw_pointer(event)?;
        let p = raw.primary()?;
        let r = self.canvas.get_bounding_client_rect();
        let (_, y) = self
            .painter
            .to_field(p.x as f64 - r.left(), p.y as f64 - r.top());
        Some(y)
    }
}

fn request_animation_frame(game: Rc<RefCell<GameInner>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(move |time: f64| {
        game_loop(game, time);
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn game_loop(game: Rc<RefCell<GameInner>>, time: f64) {
    let report = {
        let mut g = game.borrow_mut();
        // Closing ends the loop
        if g.session.is_closed() {
            return;
        }

        let dt = if g.last_time > 0.0 {
            ((time - g.last_time) / 1000.0) as f32
        } else {
            SIM_DT
        };
        g.last_time = time;

        let flow = g.session.frame(dt);
        g.render();
        flow.map(|f| (flow_to_js(&f), g.on_score.clone()))
    };

    if let Some((value, Some(callback))) = report {
        if let Err(e) = callback.call1(&JsValue::NULL, &value) {
            log::warn!("Score callback threw: {:?}", e);
        }
    }
    request_animation_frame(game);
}

/// One open game
#[wasm_bindgen]
pub struct PongGame {
    inner: Rc<RefCell<GameInner>>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl PongGame {
    /// `auth` is `{ userId, displayName }` or null. `on_score` receives the
    /// end-of-round flow (`{ kind, ... }`).
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        auth: JsValue,
        on_score: Option<js_sys::Function>,
    ) -> Result<PongGame, JsValue> {
        let window = window()?;
        let canvas: HtmlCanvasElement = element_by_id(canvas_id)?.dyn_into()?;
        let painter = CanvasPainter::new(&canvas)?;
        let settings = Settings::load();

        let navigator = window.navigator();
        let device = navigator
            .user_agent()
            .map(|ua| device_kind_for(&ua, navigator.max_touch_points()))
            .unwrap_or(DeviceKind::Desktop);
        let audio = AudioEngine::new(WebAudioBackend::new(), device, &settings);
        let store = LocalLeaderboard::load(settings.leaderboard_size);
        let seed = js_sys::Date::now() as u64;
        let session = GameSession::new(seed, &settings, audio, auth_from_js(&auth), Box::new(store));
        log::info!("Game opened with seed {} ({:?})", seed, device);

        let inner = Rc::new(RefCell::new(GameInner {
            session,
            painter,
            canvas: canvas.clone(),
            settings,
            on_score,
            last_time: 0.0,
        }));

        let target: &EventTarget = canvas.as_ref();
        let win: EventTarget = window.clone().into();
        let mut listeners = Vec::new();

        // Taps start the game and initialize audio in the same handler
        for kind in ["mousedown", "touchstart"] {
            let inner = inner.clone();
            listeners.push(listen(target, kind, false, move |e| {
                if e.dyn_ref::<TouchEvent>().is_some() {
                    e.prevent_default();
                }
                let mut g = inner.borrow_mut();
                g.session.user_gesture();
                if let Some(y) = g.pointer_field_y(&e) {
                    g.session.pointer_y(y);
                }
            })?);
        }

        for kind in ["mousemove", "touchmove"] {
            let inner = inner.clone();
            listeners.push(listen(target, kind, false, move |e| {
                if e.dyn_ref::<TouchEvent>().is_some() {
                    e.prevent_default();
                }
                let mut g = inner.borrow_mut();
                if let Some(y) = g.pointer_field_y(&e) {
                    g.session.pointer_y(y);
                }
            })?);
        }

        {
            let inner = inner.clone();
            listeners.push(listen(&win, "keydown", false, move |e| {
                let Some(key) = e.dyn_ref::<KeyboardEvent>().map(|k| k.key()) else {
                    return;
                };
                if matches!(key.as_str(), " " | "p" | "P") {
                    let mut g = inner.borrow_mut();
                    if matches!(g.session.phase(), GamePhase::Running | GamePhase::Paused) {
                        e.prevent_default();
                        g.session.toggle_pause();
                    }
                }
            })?);
        }

        {
            let inner = inner.clone();
            listeners.push(listen(&win, "blur", true, move |_e| {
                inner.borrow_mut().session.pause_for_blur();
            })?);
        }

        if let Some(document) = window.document() {
            let inner = inner.clone();
            let doc = document.clone();
            listeners.push(listen(document.as_ref(), "visibilitychange", true, move |_e| {
                if doc.visibility_state() == web_sys::VisibilityState::Hidden {
                    inner.borrow_mut().session.pause_for_blur();
                }
            })?);
        }

        {
            let inner = inner.clone();
            listeners.push(listen(&win, "resize", true, move |_e| {
                let mut g = inner.borrow_mut();
                let canvas = g.canvas.clone();
                g.painter.resize(&canvas);
            })?);
        }

        request_animation_frame(inner.clone());
        Ok(PongGame { inner, listeners })
    }

    /// "Enable sound" button on mobile
    #[wasm_bindgen(js_name = enableAudio)]
    pub fn enable_audio(&self) {
        self.inner.borrow_mut().session.enable_audio();
    }

    #[wasm_bindgen(js_name = togglePause)]
    pub fn toggle_pause(&self) {
        self.inner.borrow_mut().session.toggle_pause();
    }

    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&self, muted: bool) {
        let mut g = self.inner.borrow_mut();
        g.session.set_muted(muted);
        g.settings.muted = muted;
        g.settings.save();
    }

    /// Name from the prompt. Throws the validation message if rejected.
    #[wasm_bindgen(js_name = submitName)]
    pub fn submit_name(&self, name: &str) -> Result<JsValue, JsValue> {
        let mut g = self.inner.borrow_mut();
        g.session
            .submit_name(name)
            .map(|flow| flow_to_js(&flow))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = skipName)]
    pub fn skip_name(&self) -> JsValue {
        flow_to_js(&self.inner.borrow_mut().session.skip_name())
    }

    pub fn replay(&self) -> bool {
        self.inner.borrow_mut().session.replay()
    }

    pub fn score(&self) -> u32 {
        self.inner.borrow().session.sim().score
    }

    /// Current leaderboard as `[{ rank, player_name, score }]`
    pub fn leaderboard(&self) -> Result<JsValue, JsValue> {
        let entries = self.inner.borrow().session.leaderboard();
        let json = serde_json::to_string(&entries).map_err(|e| JsValue::from_str(&e.to_string()))?;
        js_sys::JSON::parse(&json)
    }

    /// Stop the loop, release audio and detach input
    pub fn close(&mut self) {
        if let Ok(mut g) = self.inner.try_borrow_mut() {
            g.session.close();
            g.on_score = None;
        }
        self.listeners.clear();
    }
}

impl Drop for PongGame {
    fn drop(&mut self) {
        self.close();
    }
}
