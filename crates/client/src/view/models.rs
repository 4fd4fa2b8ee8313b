//! Display data derived from backend payloads.
//!
//! Everything here is pure: a payload goes in, strings come out. Views only
//! lay these out.

use chrono::NaiveDateTime;
use clicleitura_core::{CartItemId, OrderId, OrderStatus};

use crate::api::{Cart, CartItem, Profile};
use crate::checkout::PendingOrder;
use crate::session::Session;

/// Titles longer than this are cut and suffixed with `...`.
pub const TITLE_MAX_CHARS: usize = 50;

/// Prefix for image names that are not absolute URLs.
pub const IMAGE_BASE_PATH: &str = "/static/images/";

/// Empty cart heading.
pub const EMPTY_CART_TITLE: &str = "Carrinho Vazio";

/// Empty cart hint.
pub const EMPTY_CART_HINT: &str = "Adicione livros ao seu carrinho para começar!";

// =============================================================================
// Cart
// =============================================================================

/// Cart row display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRowView {
    /// What the remove control sends.
    pub id: CartItemId,
    pub title: String,
    pub author: String,
    pub price: String,
    pub image_url: String,
}

impl From<&CartItem> for CartRowView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            title: truncate_title(&item.title),
            author: item.author.clone(),
            price: item.price.to_string(),
            image_url: image_url(&item.image),
        }
    }
}

/// Cart panel display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    /// Count badge; `None` hides it.
    pub badge: Option<usize>,
    /// Backend-reported total, formatted.
    pub total: String,
    pub rows: Vec<CartRowView>,
}

impl CartView {
    /// What a guest or a failed first load shows.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_cart(&Cart::default())
    }

    /// Build the panel for `cart`.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            badge: (!cart.is_empty()).then(|| cart.len()),
            total: cart.total.to_string(),
            rows: cart.items.iter().map(CartRowView::from).collect(),
        }
    }

    /// Whether the empty-state message is shown instead of rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let cut: String = title.chars().take(TITLE_MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        title.to_string()
    }
}

fn image_url(image: &str) -> String {
    if image.is_empty() || image.starts_with("http") {
        image.to_string()
    } else {
        format!("{IMAGE_BASE_PATH}{image}")
    }
}

// =============================================================================
// Payment panel
// =============================================================================

/// PIX payment panel display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPanel {
    pub order_id: OrderId,
    /// `Pedido #55`
    pub heading: String,
    /// `R$ 19.98`, whole-cart orders only.
    pub total: Option<String>,
    /// `2 livro(s)`, whole-cart orders only.
    pub item_count: Option<String>,
    /// `data:image/png;base64,...`
    pub qr_data_uri: String,
    pub payment_code: String,
}

impl PaymentPanel {
    /// Build the panel for a pending order.
    #[must_use]
    pub fn from_order(order: &PendingOrder) -> Self {
        Self {
            order_id: order.order_id,
            heading: format!("Pedido #{}", order.order_id),
            total: order.total.map(|total| total.to_string()),
            item_count: order.item_count.map(|n| format!("{n} livro(s)")),
            qr_data_uri: format!("data:image/png;base64,{}", order.qr_base64),
            payment_code: order.payment_code.clone(),
        }
    }
}

/// Status line under the payment panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Progress(String),
    Success(String),
    Failure(String),
}

// =============================================================================
// Header
// =============================================================================

/// Login-dependent header state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    /// `Olá, Ana!` when logged in.
    pub greeting: Option<String>,
    pub show_login: bool,
    pub show_profile: bool,
    pub show_logout: bool,
}

impl HeaderView {
    /// Header for the given session.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let greeting = session
            .identity()
            .map(|identity| format!("Olá, {}!", identity.first_name()));
        let logged_in = greeting.is_some();
        Self {
            greeting,
            show_login: !logged_in,
            show_profile: logged_in,
            show_logout: logged_in,
        }
    }
}

// =============================================================================
// Profile
// =============================================================================

/// One row of the order history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRowView {
    pub id: OrderId,
    pub title: String,
    pub price: String,
    pub status: OrderStatus,
    pub date: String,
}

/// Profile page display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub member_since: Option<String>,
    pub total_orders: u32,
    pub paid_orders: u32,
    pub pending_orders: u32,
    pub total_spent: String,
    pub orders: Vec<OrderRowView>,
}

impl ProfileView {
    /// Build the profile page.
    #[must_use]
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.user.name.clone(),
            email: profile.user.email.to_string(),
            member_since: profile.user.member_since.as_deref().map(format_date),
            total_orders: profile.stats.total_orders,
            paid_orders: profile.stats.paid_orders,
            pending_orders: profile.stats.pending_orders,
            total_spent: profile.stats.total_spent.to_string(),
            orders: profile
                .orders
                .iter()
                .map(|order| OrderRowView {
                    id: order.id,
                    title: order
                        .title
                        .clone()
                        .unwrap_or_else(|| "Livro indisponível".to_string()),
                    price: order.price.to_string(),
                    status: order.status,
                    date: order.created_at.as_deref().map(format_date).unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// `2024-03-02 11:00:00` → `02/03/2024`; anything else is shown as-is.
fn format_date(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map_or_else(
        |_| raw.to_string(),
        |dt| dt.format("%d/%m/%Y").to_string(),
    )
}
