//! Terminal rendition of the storefront.
//!
//! The cart panel is only printed in full while it is open; otherwise a
//! cart render just updates the badge line. QR codes are written as PNG
//! files since a terminal cannot show the image.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clicleitura_client::View;
use clicleitura_client::view::models::{EMPTY_CART_HINT, EMPTY_CART_TITLE};
use clicleitura_client::view::{CartView, HeaderView, PaymentPanel, ProfileView, Route, StatusLine};
use tracing::{debug, warn};

/// A [`View`] printing to any writer.
pub struct TerminalView<W> {
    out: W,
    qr_dir: PathBuf,
    cart: Option<CartView>,
    cart_open: bool,
}

impl<W: Write> TerminalView<W> {
    /// Print to `out`, saving QR codes under `qr_dir`.
    pub fn new(out: W, qr_dir: impl Into<PathBuf>) -> Self {
        Self {
            out,
            qr_dir: qr_dir.into(),
            cart: None,
            cart_open: false,
        }
    }

    /// Print a prompt without a trailing newline.
    pub fn prompt(&mut self, text: &str) {
        if let Err(e) = write!(self.out, "{text}").and_then(|()| self.out.flush()) {
            warn!(error = %e, "Failed to write to terminal");
        }
    }

    /// Print one line.
    pub fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            warn!(error = %e, "Failed to write to terminal");
        }
    }

    #[cfg(test)]
    pub const fn output(&self) -> &W {
        &self.out
    }

    fn print_cart(&mut self) {
        let Some(cart) = self.cart.clone() else {
            self.line("🛒 Carregando carrinho...");
            return;
        };

        self.line("──────── Carrinho ────────");
        if cart.is_empty() {
            self.line(EMPTY_CART_TITLE);
            self.line(EMPTY_CART_HINT);
        } else {
            for row in &cart.rows {
                self.line(&format!(
                    "[{}] {} ({}) {}",
                    row.id, row.title, row.author, row.price
                ));
            }
        }
        self.line(&format!("Total: {}", cart.total));
        self.line("──────────────────────────");
    }

    fn save_qr(&self, panel: &PaymentPanel, qr_png: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.qr_dir)?;
        let path = qr_path(&self.qr_dir, panel);
        fs::write(&path, qr_png)?;
        Ok(path)
    }
}

fn qr_path(dir: &Path, panel: &PaymentPanel) -> PathBuf {
    dir.join(format!("pedido-{}.png", panel.order_id))
}

impl<W: Write> View for TerminalView<W> {
    fn render_header(&mut self, header: &HeaderView) {
        let links: Vec<&str> = [
            (header.show_login, "entrar"),
            (header.show_profile, "perfil"),
            (header.show_logout, "sair"),
        ]
        .into_iter()
        .filter_map(|(shown, label)| shown.then_some(label))
        .collect();

        let links = links.join(" | ");
        match &header.greeting {
            Some(greeting) => self.line(&format!("📚 ClicLeitura · {greeting} [{links}]")),
            None => self.line(&format!("📚 ClicLeitura [{links}]")),
        }
    }

    fn render_cart(&mut self, cart: &CartView) {
        self.cart = Some(cart.clone());
        if self.cart_open {
            self.print_cart();
        } else if let Some(count) = cart.badge {
            self.line(&format!("🛒 {count} · {}", cart.total));
        } else {
            self.line("🛒 vazio");
        }
    }

    fn open_cart(&mut self) {
        self.cart_open = true;
        if self.cart.is_some() {
            self.print_cart();
        }
    }

    fn close_cart(&mut self) {
        self.cart_open = false;
    }

    fn show_payment_panel(&mut self, panel: &PaymentPanel, qr_png: &[u8]) {
        self.line(&format!("════════ {} ════════", panel.heading));
        if let Some(total) = &panel.total {
            self.line(&format!("Total: {total}"));
        }
        if let Some(count) = &panel.item_count {
            self.line(&format!("Itens: {count}"));
        }

        match self.save_qr(panel, qr_png) {
            Ok(path) => {
                debug!(path = %path.display(), bytes = qr_png.len(), "QR code saved");
                self.line(&format!("QR Code: {}", path.display()));
            }
            Err(e) => {
                warn!(error = %e, "Could not save QR code");
                self.line("QR Code indisponível; use o código abaixo.");
            }
        }

        self.line("PIX copia e cola:");
        self.line(&panel.payment_code);
        self.line("Comandos: paid (já paguei) · copy (copiar código) · close (fechar)");
    }

    fn set_payment_status(&mut self, status: &StatusLine) {
        let (StatusLine::Progress(text) | StatusLine::Success(text) | StatusLine::Failure(text)) =
            status;
        self.line(text);
    }

    fn close_payment_panel(&mut self) {
        self.line("════════════════════════");
    }

    fn render_profile(&mut self, profile: &ProfileView) {
        self.line(&format!("👤 {} <{}>", profile.name, profile.email));
        if let Some(since) = &profile.member_since {
            self.line(&format!("Membro desde {since}"));
        }
        self.line(&format!(
            "Pedidos: {} · Pagos: {} · Pendentes: {} · Total gasto: {}",
            profile.total_orders, profile.paid_orders, profile.pending_orders, profile.total_spent
        ));

        if profile.orders.is_empty() {
            self.line("Você ainda não fez nenhum pedido.");
            return;
        }
        for order in &profile.orders {
            self.line(&format!(
                "#{} {} · {} · {} · {}",
                order.id, order.title, order.price, order.status, order.date
            ));
        }
    }

    fn alert(&mut self, message: &str) {
        self.line(&format!("» {message}"));
    }

    fn navigate(&mut self, route: Route) {
        match route {
            Route::Login => self.line("→ /login (use: clicleitura login -e <email>)"),
            other => self.line(&format!("→ {}", other.path())),
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        writeln!(self.out, "{text}").map_err(|e| e.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clicleitura_client::Session;
    use clicleitura_client::view::CartRowView;
    use clicleitura_core::{CartItemId, Email, OrderId, UserId, UserIdentity};
    use tempfile::TempDir;

    use super::*;

    fn output(view: &TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.output().clone()).unwrap()
    }

    fn view_in(dir: &TempDir) -> TerminalView<Vec<u8>> {
        TerminalView::new(Vec::new(), dir.path().join("qr"))
    }

    fn two_rows() -> CartView {
        let row = |id: i64, title: &str, price: &str| CartRowView {
            id: CartItemId::new(id),
            title: title.to_string(),
            author: "X".to_string(),
            price: price.to_string(),
            image_url: String::new(),
        };
        CartView {
            badge: Some(2),
            total: "R$ 19.98".to_string(),
            rows: vec![row(1, "Foo", "R$ 10.00"), row(2, "Bar", "R$ 9.98")],
        }
    }

    #[test]
    fn test_closed_cart_prints_badge_only() {
        let dir = TempDir::new().unwrap();
        let mut view = view_in(&dir);
        view.render_cart(&two_rows());
        assert_eq!(output(&view), "🛒 2 · R$ 19.98\n");
    }

    #[test]
    fn test_open_cart_prints_rows() {
        let dir = TempDir::new().unwrap();
        let mut view = view_in(&dir);
        view.open_cart();
        view.render_cart(&two_rows());

        let out = output(&view);
        assert!(out.contains("[1] Foo (X) R$ 10.00"));
        assert!(out.contains("Total: R$ 19.98"));
    }

    #[test]
    fn test_empty_cart_message() {
        let dir = TempDir::new().unwrap();
        let mut view = view_in(&dir);
        view.open_cart();
        view.render_cart(&CartView::empty());
        assert!(output(&view).contains("Carrinho Vazio"));
    }

    #[test]
    fn test_payment_panel_saves_qr() {
        let dir = TempDir::new().unwrap();
        let mut view = view_in(&dir);
        let panel = PaymentPanel {
            order_id: OrderId::new(55),
            heading: "Pedido #55".to_string(),
            total: Some("R$ 19.98".to_string()),
            item_count: Some("2 livro(s)".to_string()),
            qr_data_uri: String::new(),
            payment_code: "00020126".to_string(),
        };
        view.show_payment_panel(&panel, b"\x89PNG");

        let out = output(&view);
        assert!(out.contains("Pedido #55"));
        assert!(out.contains("2 livro(s)"));
        assert!(out.contains("00020126"));
        let saved = fs::read(dir.path().join("qr").join("pedido-55.png")).unwrap();
        assert_eq!(saved, b"\x89PNG");
    }

    #[test]
    fn test_header_greeting() {
        let dir = TempDir::new().unwrap();
        let mut view = view_in(&dir);
        let session = Session::LoggedIn(UserIdentity {
            id: UserId::new(7),
            name: "Ana Souza".to_string(),
            email: Email::parse("a@b.com").unwrap(),
        });
        view.render_header(&HeaderView::from_session(&session));
        assert_eq!(output(&view), "📚 ClicLeitura · Olá, Ana! [perfil | sair]\n");
    }
}
