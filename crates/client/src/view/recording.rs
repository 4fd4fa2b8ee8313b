//! A [`View`] that records every call.

use super::{CartView, HeaderView, PaymentPanel, ProfileView, Route, StatusLine, View};

/// One call made on a [`RecordingView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Header(HeaderView),
    Cart(CartView),
    CartOpened,
    CartClosed,
    PaymentPanel(PaymentPanel),
    PaymentStatus(StatusLine),
    PaymentPanelClosed,
    Profile(ProfileView),
    Alert(String),
    Navigate(Route),
    Copied(String),
}

/// Records calls instead of drawing anything.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
    /// When set, clipboard copies fail with this reason.
    pub clipboard_error: Option<String>,
}

impl RecordingView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts shown, in order.
    #[must_use]
    pub fn alerts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Alert(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The most recently rendered cart.
    #[must_use]
    pub fn last_cart(&self) -> Option<&CartView> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::Cart(cart) => Some(cart),
            _ => None,
        })
    }

    /// Routes navigated to, in order.
    #[must_use]
    pub fn navigations(&self) -> Vec<Route> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Navigate(route) => Some(*route),
                _ => None,
            })
            .collect()
    }

    /// Whether the payment panel is currently shown.
    #[must_use]
    pub fn payment_panel_open(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                ViewEvent::PaymentPanel(_) => Some(true),
                ViewEvent::PaymentPanelClosed => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Drop recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl View for RecordingView {
    fn render_header(&mut self, header: &HeaderView) {
        self.events.push(ViewEvent::Header(header.clone()));
    }

    fn render_cart(&mut self, cart: &CartView) {
        self.events.push(ViewEvent::Cart(cart.clone()));
    }

    fn open_cart(&mut self) {
        self.events.push(ViewEvent::CartOpened);
    }

    fn close_cart(&mut self) {
        self.events.push(ViewEvent::CartClosed);
    }

    fn show_payment_panel(&mut self, panel: &PaymentPanel, _qr_png: &[u8]) {
        self.events.push(ViewEvent::PaymentPanel(panel.clone()));
    }

    fn set_payment_status(&mut self, status: &StatusLine) {
        self.events.push(ViewEvent::PaymentStatus(status.clone()));
    }

    fn close_payment_panel(&mut self) {
        self.events.push(ViewEvent::PaymentPanelClosed);
    }

    fn render_profile(&mut self, profile: &ProfileView) {
        self.events.push(ViewEvent::Profile(profile.clone()));
    }

    fn alert(&mut self, message: &str) {
        self.events.push(ViewEvent::Alert(message.to_string()));
    }

    fn navigate(&mut self, route: Route) {
        self.events.push(ViewEvent::Navigate(route));
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        if let Some(reason) = &self.clipboard_error {
            return Err(reason.clone());
        }
        self.events.push(ViewEvent::Copied(text.to_string()));
        Ok(())
    }
}
