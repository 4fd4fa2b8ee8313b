//! Rendering boundary.
//!
//! The controller never formats output itself: it builds display data from
//! [`models`] and hands it to a [`View`]. The CLI renders to a terminal;
//! [`RecordingView`] keeps every call for assertions.

pub mod models;
mod recording;

pub use models::{
    CartRowView, CartView, HeaderView, OrderRowView, PaymentPanel, ProfileView, StatusLine,
};
pub use recording::{RecordingView, ViewEvent};

use clicleitura_core::BookId;

/// Places the controller can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    /// Profile and order history.
    Profile,
    Book(BookId),
}

impl Route {
    /// Storefront path of this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Profile => "/perfil".to_string(),
            Self::Book(id) => format!("/livro/{id}"),
        }
    }
}

/// Everything the storefront shows.
pub trait View {
    /// Login-dependent header links and greeting.
    fn render_header(&mut self, header: &HeaderView);

    /// Replace the cart panel and count badge.
    fn render_cart(&mut self, cart: &CartView);

    fn open_cart(&mut self);

    fn close_cart(&mut self);

    /// Show the PIX panel. `qr_png` is the decoded QR image.
    fn show_payment_panel(&mut self, panel: &PaymentPanel, qr_png: &[u8]);

    /// Update the status line of the payment panel.
    fn set_payment_status(&mut self, status: &StatusLine);

    fn close_payment_panel(&mut self);

    fn render_profile(&mut self, profile: &ProfileView);

    /// Blocking notice to the user.
    fn alert(&mut self, message: &str);

    fn navigate(&mut self, route: Route);

    /// Put `text` on the clipboard.
    ///
    /// # Errors
    ///
    /// Returns a description of why the copy failed.
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String>;
}
