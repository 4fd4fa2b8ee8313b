//! Cart, checkout and PIX payment workflow.
//!
//! [`CartCheckoutController`] is built once per page lifetime. It owns the
//! session read at construction, the checkout state and the view; every
//! user action maps to one method. Failures are reported to the view (alert
//! or status line) and also returned, so callers can react without parsing
//! what was shown.

use clicleitura_core::{BookId, CartItemId, Email, OrderId, UserIdentity};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::StorefrontApi;
use crate::checkout::{CheckoutState, OrderKind, PendingOrder};
use crate::error::{ClientError, Precondition, Result};
use crate::session::{Session, SessionStore};
use crate::view::{CartView, HeaderView, PaymentPanel, ProfileView, Route, StatusLine, View};

const LOGIN_TO_VIEW_CART: &str = "Você precisa fazer login para ver o carrinho!";
const LOGIN_TO_ADD: &str = "⚠️ Você precisa fazer login para adicionar ao carrinho!";
const LOGIN_TO_BUY: &str = "⚠️ Você precisa fazer login antes de comprar!";
const LOGIN_TO_VIEW_PROFILE: &str = "Você precisa fazer login para ver seu perfil!";
const ADDED_TO_CART: &str = "✅ Livro adicionado ao carrinho!";
const CONFIRMING: &str = "🔄 Validando pagamento...";
const DEFAULT_CONFIRMATION: &str =
    "Pagamento confirmado! Seu pedido está aguardando aprovação do administrador.";
const CODE_COPIED: &str = "✅ Código PIX copiado! Cole no seu aplicativo bancário.";
const COPY_FAILED: &str = "❌ Erro ao copiar. Tente selecionar e copiar manualmente.";

/// Drives the storefront's cart and checkout for one page lifetime.
pub struct CartCheckoutController<A, V> {
    api: A,
    view: V,
    store: SessionStore,
    session: Session,
    checkout: CheckoutState,
    location: Route,
}

impl<A: StorefrontApi, V: View> CartCheckoutController<A, V> {
    /// Start a page lifetime, reading the cached identity from `store` once.
    pub fn new(api: A, view: V, store: SessionStore) -> Self {
        let session = store.load();
        Self::with_session(api, view, store, session)
    }

    /// Start a page lifetime with an already loaded session.
    pub const fn with_session(api: A, view: V, store: SessionStore, session: Session) -> Self {
        Self {
            api,
            view,
            store,
            session,
            checkout: CheckoutState::NoOrder,
            location: Route::Home,
        }
    }

    /// Where the user currently is; remembered when a login is required.
    pub const fn set_location(&mut self, route: Route) {
        self.location = route;
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    pub const fn checkout_state(&self) -> &CheckoutState {
        &self.checkout
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    pub const fn view(&self) -> &V {
        &self.view
    }

    pub const fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    // =========================================================================
    // Page & cart
    // =========================================================================

    /// Render the header and, for logged-in users, the cart.
    #[instrument(skip(self))]
    pub async fn on_page_load(&mut self) {
        self.view.render_header(&HeaderView::from_session(&self.session));
        // Cart failures are soft and already logged.
        let _ = self.load_cart().await;
    }

    /// Fetch and render the cart.
    ///
    /// Guests are skipped (`Ok(None)`). Failures are logged and leave the
    /// view untouched; they are never alerted.
    ///
    /// # Errors
    ///
    /// Returns the fetch error so callers can tell a skipped load from a failed one.
    #[instrument(skip(self))]
    pub async fn load_cart(&mut self) -> Result<Option<CartView>> {
        let Some(user_id) = self.session.identity().map(|identity| identity.id) else {
            return Ok(None);
        };

        match self.api.fetch_cart(user_id).await {
            Ok(cart) => {
                let view = CartView::from_cart(&cart);
                self.view.render_cart(&view);
                Ok(Some(view))
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Failed to load cart");
                Err(e)
            }
        }
    }

    /// Remove a cart row, then reload the whole cart once.
    ///
    /// # Errors
    ///
    /// Returns the removal error after alerting it.
    #[instrument(skip(self))]
    pub async fn remove_item(&mut self, item_id: CartItemId) -> Result<()> {
        if let Err(e) = self.api.remove_cart_item(item_id).await {
            self.alert_error(&e);
            return Err(e);
        }

        info!(%item_id, "Cart item removed");
        let _ = self.load_cart().await;
        Ok(())
    }

    /// Add a book to the cart and refresh the badge.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::NotLoggedIn` for guests, or the backend error.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&mut self, book_id: BookId) -> Result<()> {
        let identity = self.require_login(LOGIN_TO_ADD)?;

        if let Err(e) = self.api.add_to_cart(identity.id, book_id).await {
            self.alert_error(&e);
            return Err(e);
        }

        self.view.alert(ADDED_TO_CART);
        let _ = self.load_cart().await;
        Ok(())
    }

    /// Open the cart panel.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::NotLoggedIn` for guests, who are sent to login.
    pub fn open_cart(&mut self) -> Result<()> {
        if !self.session.is_logged_in() {
            self.view.alert(LOGIN_TO_VIEW_CART);
            self.view.navigate(Route::Login);
            return Err(Precondition::NotLoggedIn.into());
        }
        self.view.open_cart();
        Ok(())
    }

    pub fn close_cart(&mut self) {
        self.view.close_cart();
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Buy a single book with PIX.
    ///
    /// `email` defaults to the logged-in user's address.
    ///
    /// # Errors
    ///
    /// Returns a precondition error (not logged in, order already pending)
    /// without contacting the backend, or the checkout error.
    #[instrument(skip(self, email))]
    pub async fn checkout_item(
        &mut self,
        book_id: BookId,
        email: Option<Email>,
    ) -> Result<OrderId> {
        let identity = self.require_login(LOGIN_TO_BUY)?;
        self.ensure_can_begin()?;

        let email = email.unwrap_or_else(|| identity.email.clone());
        let order = match self
            .api
            .checkout_item(book_id, &email, identity.id)
            .await
            .and_then(PendingOrder::from_single)
        {
            Ok(order) => order,
            Err(e) => {
                warn!(%book_id, error = %e, "Checkout failed");
                match e.backend_message() {
                    Some(message) => self.view.alert(&format!("Erro: {message}")),
                    None => self.alert_error(&e),
                }
                return Err(e);
            }
        };

        self.begin_order(order)
    }

    /// Turn the whole cart into one PIX order.
    ///
    /// The cart is re-fetched first; an empty cart stops the flow before the
    /// order is created. A backend refusal to list the cart counts as empty.
    ///
    /// # Errors
    ///
    /// Returns a precondition error (not logged in, order already pending,
    /// empty cart), or the fetch/finalize error.
    #[instrument(skip(self))]
    pub async fn checkout_cart(&mut self) -> Result<OrderId> {
        let identity = self.require_login(LOGIN_TO_BUY)?;
        self.ensure_can_begin()?;

        match self.api.fetch_cart(identity.id).await {
            Ok(cart) if !cart.is_empty() => {}
            Err(e @ (ClientError::Network(_) | ClientError::Decode(_))) => {
                warn!(error = %e, "Cart re-fetch failed before checkout");
                self.alert_error(&e);
                return Err(e);
            }
            Ok(_) | Err(_) => {
                let err = ClientError::from(Precondition::EmptyCart);
                self.alert_error(&err);
                return Err(err);
            }
        }

        let order = match self
            .api
            .finalize_cart_pix(identity.id, &identity.email)
            .await
            .and_then(PendingOrder::from_cart)
        {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "Cart checkout failed");
                self.alert_error(&e);
                return Err(e);
            }
        };

        let order_id = self.begin_order(order)?;
        self.view.close_cart();
        let _ = self.load_cart().await;
        Ok(order_id)
    }

    fn begin_order(&mut self, order: PendingOrder) -> Result<OrderId> {
        let order_id = order.order_id;
        let panel = PaymentPanel::from_order(&order);
        let qr_png = order.qr_png.clone();
        self.checkout.begin(order)?;
        self.view.show_payment_panel(&panel, &qr_png);
        info!(%order_id, "PIX charge created");
        Ok(order_id)
    }

    fn ensure_can_begin(&mut self) -> Result<()> {
        if let Err(p) = self.checkout.ensure_can_begin() {
            let err = ClientError::from(p);
            self.alert_error(&err);
            return Err(err);
        }
        Ok(())
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Report the pending order as paid.
    ///
    /// On success the panel closes and the user is sent to the order history.
    /// On failure the backend's message is shown and the order stays pending,
    /// so the call can be retried.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::NoActiveOrder` without contacting the backend,
    /// or the confirmation error.
    #[instrument(skip(self))]
    pub async fn confirm_payment(&mut self) -> Result<OrderId> {
        let Some((order_id, kind)) = self
            .checkout
            .pending()
            .map(|order| (order.order_id, order.kind))
        else {
            let err = ClientError::from(Precondition::NoActiveOrder);
            self.alert_error(&err);
            return Err(err);
        };

        self.view
            .set_payment_status(&StatusLine::Progress(CONFIRMING.to_string()));

        let result = match kind {
            OrderKind::SingleItem => self.api.confirm_payment(order_id).await,
            OrderKind::WholeCart => self.api.confirm_pix_payment(order_id).await,
        };

        match result {
            Ok(confirmation) => {
                let message = confirmation
                    .message
                    .unwrap_or_else(|| DEFAULT_CONFIRMATION.to_string());
                self.view
                    .set_payment_status(&StatusLine::Success(format!("✅ {message}")));
                self.view.alert(&format!("✅ {message}"));
                self.checkout.confirm()?;
                self.view.close_payment_panel();
                self.view.navigate(Route::Profile);
                info!(%order_id, "Payment reported");
                Ok(order_id)
            }
            Err(e) => {
                warn!(%order_id, error = %e, "Payment confirmation failed");
                let message = e.user_message();
                self.view
                    .set_payment_status(&StatusLine::Failure(format!("❌ {message}")));
                self.view.alert(&message);
                Err(e)
            }
        }
    }

    /// Close the payment panel, abandoning the pending order locally.
    ///
    /// Returns the abandoned order, if any. The backend keeps it pending.
    pub fn close_payment_panel(&mut self) -> Option<OrderId> {
        let abandoned = self.checkout.abandon().map(|order| order.order_id);
        if let Some(order_id) = abandoned {
            info!(%order_id, "Pending order abandoned");
        }
        self.view.close_payment_panel();
        abandoned
    }

    /// Copy the pending order's PIX code.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::NoActiveOrder` if nothing awaits payment.
    pub fn copy_payment_code(&mut self) -> Result<()> {
        let Some(code) = self
            .checkout
            .pending()
            .map(|order| order.payment_code.clone())
        else {
            let err = ClientError::from(Precondition::NoActiveOrder);
            self.alert_error(&err);
            return Err(err);
        };

        match self.view.copy_to_clipboard(&code) {
            Ok(()) => self.view.alert(CODE_COPIED),
            Err(reason) => {
                warn!(%reason, "Clipboard copy failed");
                self.view.alert(COPY_FAILED);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Log in and cache the identity.
    ///
    /// Returns the location remembered when a login was last required.
    ///
    /// # Errors
    ///
    /// Returns the backend error (alerted) or a session storage error.
    #[instrument(skip(self, password))]
    pub async fn login(
        &mut self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<String>> {
        let identity = match self.api.login(email, password).await {
            Ok(identity) => identity,
            Err(e) => {
                self.alert_error(&e);
                return Err(e);
            }
        };

        self.store.store(&identity)?;
        info!(user_id = %identity.id, "Logged in");
        self.session = Session::LoggedIn(identity);
        self.view.render_header(&HeaderView::from_session(&self.session));
        let _ = self.load_cart().await;
        Ok(self.store.take_redirect())
    }

    /// Log out: forget the cached identity and re-render what depends on it.
    ///
    /// # Errors
    ///
    /// Returns a session storage error if the record cannot be removed.
    #[instrument(skip(self))]
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.session = Session::Anonymous;

        if self.checkout.abandon().is_some() {
            self.view.close_payment_panel();
        }
        self.view.render_header(&HeaderView::from_session(&self.session));
        self.view.render_cart(&CartView::empty());
        self.view.navigate(Route::Home);
        info!("Logged out");
        Ok(())
    }

    /// Fetch and render the profile with the order history.
    ///
    /// # Errors
    ///
    /// Returns `Precondition::NotLoggedIn` for guests, or the fetch error.
    #[instrument(skip(self))]
    pub async fn show_profile(&mut self) -> Result<ProfileView> {
        let identity = self.require_login(LOGIN_TO_VIEW_PROFILE)?;

        match self.api.fetch_profile(identity.id).await {
            Ok(profile) => {
                let view = ProfileView::from_profile(&profile);
                self.view.render_profile(&view);
                Ok(view)
            }
            Err(e) => {
                self.alert_error(&e);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// The cached identity, or: alert, remember the location, go to login.
    fn require_login(&mut self, message: &str) -> Result<UserIdentity> {
        if let Some(identity) = self.session.identity() {
            return Ok(identity.clone());
        }

        self.view.alert(message);
        if let Err(e) = self.store.remember_redirect(&self.location.path()) {
            warn!(error = %e, "Could not remember redirect location");
        }
        self.view.navigate(Route::Login);
        Err(Precondition::NotLoggedIn.into())
    }

    fn alert_error(&mut self, err: &ClientError) {
        self.view.alert(&err.user_message());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use clicleitura_core::{Price, UserId};
    use tempfile::TempDir;

    use super::*;
    use crate::api::{Cart, CartItem, CartPixCharge, Confirmation, PixCharge, Profile};
    use crate::view::{RecordingView, ViewEvent};

    const QR: &str = "iVBORw0KGgo=";

    #[derive(Clone, Copy)]
    enum Fail {
        Network,
        Decode,
        Backend(u16, &'static str),
    }

    impl Fail {
        fn to_error(self) -> ClientError {
            match self {
                Self::Network => ClientError::Network("connection refused".to_string()),
                Self::Decode => ClientError::Decode("invalid type: null".to_string()),
                Self::Backend(status, message) => ClientError::Backend {
                    status,
                    message: message.to_string(),
                },
            }
        }
    }

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<&'static str>>,
        failures: Mutex<HashMap<&'static str, Fail>>,
        cart: Mutex<Cart>,
        next_order: Mutex<i64>,
    }

    impl FakeApi {
        fn with_cart(cart: Cart) -> Self {
            Self {
                cart: Mutex::new(cart),
                next_order: Mutex::new(55),
                ..Self::default()
            }
        }

        fn fail(&self, op: &'static str, fail: Fail) {
            self.failures.lock().unwrap().insert(op, fail);
        }

        fn heal(&self, op: &'static str) {
            self.failures.lock().unwrap().remove(op);
        }

        fn record(&self, op: &'static str) -> Result<()> {
            self.calls.lock().unwrap().push(op);
            self.failures
                .lock()
                .unwrap()
                .get(op)
                .map_or(Ok(()), |f| Err(f.to_error()))
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, op: &str) -> usize {
            self.calls().iter().filter(|c| **c == op).count()
        }

        fn order_id(&self) -> OrderId {
            let mut next = self.next_order.lock().unwrap();
            let id = OrderId::new(*next);
            *next += 1;
            id
        }
    }

    #[async_trait]
    impl StorefrontApi for FakeApi {
        async fn fetch_cart(&self, _user_id: UserId) -> Result<Cart> {
            self.record("fetch_cart")?;
            Ok(self.cart.lock().unwrap().clone())
        }

        async fn remove_cart_item(&self, item_id: CartItemId) -> Result<()> {
            self.record("remove_cart_item")?;
            let mut cart = self.cart.lock().unwrap();
            cart.items.retain(|item| item.id != item_id);
            Ok(())
        }

        async fn add_to_cart(&self, _user_id: UserId, _book_id: BookId) -> Result<()> {
            self.record("add_to_cart")
        }

        async fn checkout_item(
            &self,
            _book_id: BookId,
            _email: &Email,
            _user_id: UserId,
        ) -> Result<PixCharge> {
            self.record("checkout_item")?;
            Ok(PixCharge {
                order_id: self.order_id(),
                qr_base64: QR.to_string(),
                payment_code: "00020126single".to_string(),
            })
        }

        async fn confirm_payment(&self, _order_id: OrderId) -> Result<Confirmation> {
            self.record("confirm_payment")?;
            Ok(Confirmation::default())
        }

        async fn finalize_cart_pix(
            &self,
            _user_id: UserId,
            _email: &Email,
        ) -> Result<CartPixCharge> {
            self.record("finalize_cart_pix")?;
            let mut cart = self.cart.lock().unwrap();
            let charge = CartPixCharge {
                order_id: self.order_id(),
                total: cart.total,
                item_count: u32::try_from(cart.len()).unwrap(),
                qr_base64: QR.to_string(),
                payment_code: "00020126cart".to_string(),
                titles: cart.items.iter().map(|i| i.title.clone()).collect(),
            };
            *cart = Cart::default();
            Ok(charge)
        }

        async fn confirm_pix_payment(&self, _order_id: OrderId) -> Result<Confirmation> {
            self.record("confirm_pix_payment")?;
            let message = "Pagamento confirmado! Aguardando aprovação do administrador.";
            Ok(Confirmation {
                message: Some(message.to_string()),
            })
        }

        async fn login(&self, email: &Email, _password: &SecretString) -> Result<UserIdentity> {
            self.record("login")?;
            Ok(UserIdentity {
                id: UserId::new(7),
                name: "Ana Souza".to_string(),
                email: email.clone(),
            })
        }

        async fn fetch_profile(&self, _user_id: UserId) -> Result<Profile> {
            self.record("fetch_profile")?;
            Err(ClientError::Decode("not scripted".to_string()))
        }
    }

    fn identity() -> UserIdentity {
        UserIdentity {
            id: UserId::new(7),
            name: "Ana Souza".to_string(),
            email: Email::parse("a@b.com").unwrap(),
        }
    }

    fn two_item_cart() -> Cart {
        let item = |id: i64, title: &str, centavos: i64| CartItem {
            id: CartItemId::new(id),
            book_id: Some(BookId::new(id + 100)),
            title: title.to_string(),
            author: "X".to_string(),
            price: Price::from_centavos(centavos),
            image: String::new(),
        };
        Cart {
            items: vec![item(1, "Foo", 1000), item(2, "Bar", 998)],
            total: Price::from_centavos(1998),
        }
    }

    type Page = CartCheckoutController<FakeApi, RecordingView>;

    /// The store lives in `dir`, which must outlive the controller.
    fn page(cart: Cart, session: Session) -> (TempDir, Page) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("session.json"));
        let ctl = CartCheckoutController::with_session(
            FakeApi::with_cart(cart),
            RecordingView::new(),
            store,
            session,
        );
        (dir, ctl)
    }

    fn logged_in(cart: Cart) -> (TempDir, Page) {
        page(cart, Session::LoggedIn(identity()))
    }

    fn guest() -> (TempDir, Page) {
        page(two_item_cart(), Session::Anonymous)
    }

    // -------------------------------------------------------------------------
    // Cart view
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_load_cart_badge_and_total() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        let view = ctl.load_cart().await.unwrap().unwrap();

        assert_eq!(view.badge, Some(2));
        assert_eq!(view.total, "R$ 19.98");
        assert_eq!(ctl.view().last_cart(), Some(&view));
    }

    #[tokio::test]
    async fn test_load_empty_cart_hides_badge() {
        let (_dir, mut ctl) = logged_in(Cart::default());
        let view = ctl.load_cart().await.unwrap().unwrap();

        assert_eq!(view.badge, None);
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_guest_cart_load_is_skipped() {
        let (_dir, mut ctl) = guest();
        assert!(ctl.load_cart().await.unwrap().is_none());
        assert!(ctl.api().calls().is_empty());
        assert!(ctl.view().events.is_empty());
    }

    #[tokio::test]
    async fn test_failed_cart_load_is_silent() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.load_cart().await.unwrap();
        ctl.view_mut().clear();
        ctl.api().fail("fetch_cart", Fail::Backend(500, "Erro ao carregar carrinho"));

        assert!(ctl.load_cart().await.is_err());
        assert!(ctl.view().events.is_empty());
    }

    #[tokio::test]
    async fn test_page_load_renders_header_then_cart() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.on_page_load().await;

        let events = &ctl.view().events;
        assert!(matches!(
            &events[0],
            ViewEvent::Header(h) if h.greeting.as_deref() == Some("Olá, Ana!")
        ));
        assert!(matches!(&events[1], ViewEvent::Cart(c) if c.badge == Some(2)));
    }

    #[tokio::test]
    async fn test_remove_item_reloads_exactly_once() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.remove_item(CartItemId::new(1)).await.unwrap();

        assert_eq!(ctl.api().calls(), vec!["remove_cart_item", "fetch_cart"]);
        assert_eq!(ctl.view().last_cart().unwrap().badge, Some(1));
    }

    #[tokio::test]
    async fn test_remove_item_failure_alerts_backend_message() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.api().fail("remove_cart_item", Fail::Backend(500, "Erro ao remover item: disco cheio"));

        assert!(ctl.remove_item(CartItemId::new(1)).await.is_err());
        assert_eq!(ctl.view().alerts(), vec!["Erro ao remover item: disco cheio"]);
        assert_eq!(ctl.api().count("fetch_cart"), 0);
    }

    #[tokio::test]
    async fn test_remove_item_network_failure_alerts_generic_text() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.api().fail("remove_cart_item", Fail::Network);

        assert!(ctl.remove_item(CartItemId::new(1)).await.is_err());
        assert_eq!(ctl.view().alerts(), vec!["Erro ao conectar com o servidor"]);
    }

    #[tokio::test]
    async fn test_add_to_cart_refreshes_badge() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.add_to_cart(BookId::new(3)).await.unwrap();

        assert_eq!(ctl.api().calls(), vec!["add_to_cart", "fetch_cart"]);
        assert_eq!(ctl.view().alerts(), vec![ADDED_TO_CART]);
    }

    #[tokio::test]
    async fn test_add_to_cart_duplicate_is_alerted() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.api().fail("add_to_cart", Fail::Backend(400, "Este livro já está no carrinho"));

        assert!(ctl.add_to_cart(BookId::new(3)).await.is_err());
        assert_eq!(ctl.view().alerts(), vec!["Este livro já está no carrinho"]);
    }

    #[test]
    fn test_guest_cannot_open_cart() {
        let (_dir, mut ctl) = guest();
        assert!(ctl.open_cart().is_err());
        assert_eq!(ctl.view().alerts(), vec![LOGIN_TO_VIEW_CART]);
        assert_eq!(ctl.view().navigations(), vec![Route::Login]);
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_guest_checkout_redirects_without_network() {
        let (_dir, mut ctl) = guest();
        ctl.set_location(Route::Book(BookId::new(3)));

        let err = ctl.checkout_item(BookId::new(3), None).await.unwrap_err();
        assert!(matches!(err, ClientError::Precondition(Precondition::NotLoggedIn)));
        assert!(ctl.api().calls().is_empty());
        assert_eq!(ctl.view().navigations(), vec![Route::Login]);
        assert_eq!(ctl.store.take_redirect().as_deref(), Some("/livro/3"));

        assert!(ctl.checkout_cart().await.is_err());
        assert!(ctl.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_single_checkout_shows_panel() {
        let (_dir, mut ctl) = logged_in(Cart::default());
        let order_id = ctl.checkout_item(BookId::new(3), None).await.unwrap();

        assert_eq!(order_id, OrderId::new(55));
        assert!(ctl.view().payment_panel_open());
        let pending = ctl.checkout_state().pending().unwrap();
        assert_eq!(pending.kind, OrderKind::SingleItem);
        assert_eq!(pending.payment_code, "00020126single");
    }

    #[tokio::test]
    async fn test_single_checkout_backend_error() {
        let (_dir, mut ctl) = logged_in(Cart::default());
        ctl.api().fail("checkout_item", Fail::Backend(404, "Livro indisponível"));

        assert!(ctl.checkout_item(BookId::new(3), None).await.is_err());
        assert_eq!(ctl.view().alerts(), vec!["Erro: Livro indisponível"]);
        assert_eq!(ctl.checkout_state(), &CheckoutState::NoOrder);
        assert!(!ctl.view().payment_panel_open());
    }

    #[tokio::test]
    async fn test_cart_checkout_scenario() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        let order_id = ctl.checkout_cart().await.unwrap();
        assert_eq!(order_id, OrderId::new(55));

        let panel = ctl
            .view()
            .events
            .iter()
            .find_map(|e| match e {
                ViewEvent::PaymentPanel(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(panel.heading, "Pedido #55");
        assert_eq!(panel.total.as_deref(), Some("R$ 19.98"));
        assert_eq!(panel.item_count.as_deref(), Some("2 livro(s)"));
        assert_eq!(panel.qr_data_uri, format!("data:image/png;base64,{QR}"));

        assert_eq!(
            ctl.api().calls(),
            vec!["fetch_cart", "finalize_cart_pix", "fetch_cart"]
        );
        assert!(ctl.view().events.contains(&ViewEvent::CartClosed));
        assert_eq!(ctl.view().last_cart().unwrap().badge, None);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_never_finalizes() {
        let (_dir, mut ctl) = logged_in(Cart::default());
        let err = ctl.checkout_cart().await.unwrap_err();

        assert!(matches!(err, ClientError::Precondition(Precondition::EmptyCart)));
        assert_eq!(ctl.api().calls(), vec!["fetch_cart"]);
        assert_eq!(ctl.view().alerts(), vec!["Seu carrinho está vazio!"]);
    }

    #[tokio::test]
    async fn test_cart_checkout_unreachable_backend() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.api().fail("fetch_cart", Fail::Network);

        assert!(ctl.checkout_cart().await.unwrap_err().is_transport());
        assert_eq!(ctl.view().alerts(), vec!["Erro ao conectar com o servidor"]);
        assert_eq!(ctl.api().count("finalize_cart_pix"), 0);
    }

    #[tokio::test]
    async fn test_cart_checkout_unreadable_cart_is_not_reported_empty() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.api().fail("fetch_cart", Fail::Decode);

        let err = ctl.checkout_cart().await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(ctl.view().alerts(), vec!["Resposta inesperada do servidor"]);
        assert_eq!(ctl.api().count("finalize_cart_pix"), 0);
    }

    #[tokio::test]
    async fn test_cart_checkout_with_imageless_book() {
        let mut cart = two_item_cart();
        cart.items[1].image = "bar.jpg".to_string();
        let (_dir, mut ctl) = logged_in(cart);

        let view = ctl.load_cart().await.unwrap().unwrap();
        assert_eq!(view.rows[0].image_url, "");
        assert_eq!(view.rows[1].image_url, "/static/images/bar.jpg");
        assert_eq!(ctl.checkout_cart().await.unwrap(), OrderId::new(55));
    }

    #[tokio::test]
    async fn test_cart_checkout_finalize_error() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.api()
            .fail("finalize_cart_pix", Fail::Backend(500, "Erro ao gerar pagamento PIX"));

        assert!(ctl.checkout_cart().await.is_err());
        assert_eq!(ctl.view().alerts(), vec!["Erro ao gerar pagamento PIX"]);
        assert_eq!(ctl.checkout_state(), &CheckoutState::NoOrder);
        assert!(!ctl.view().events.contains(&ViewEvent::CartClosed));
    }

    #[tokio::test]
    async fn test_second_checkout_rejected_while_pending() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.checkout_item(BookId::new(3), None).await.unwrap();

        let err = ctl.checkout_cart().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Precondition(Precondition::OrderAlreadyPending(id))
                if id == OrderId::new(55)
        ));
        assert_eq!(ctl.api().calls(), vec!["checkout_item"]);
        assert_eq!(ctl.checkout_state().pending().unwrap().order_id, OrderId::new(55));
    }

    #[tokio::test]
    async fn test_closing_panel_allows_new_checkout() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.checkout_item(BookId::new(3), None).await.unwrap();

        assert_eq!(ctl.close_payment_panel(), Some(OrderId::new(55)));
        assert_eq!(ctl.checkout_state(), &CheckoutState::NoOrder);

        assert_eq!(ctl.checkout_cart().await.unwrap(), OrderId::new(56));
    }

    // -------------------------------------------------------------------------
    // Payment confirmation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_confirm_without_order_is_local() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        let err = ctl.confirm_payment().await.unwrap_err();

        assert!(matches!(err, ClientError::Precondition(Precondition::NoActiveOrder)));
        assert_eq!(ctl.view().alerts(), vec!["Nenhum pedido em andamento!"]);
        assert!(ctl.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_uses_endpoint_of_order_kind() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.checkout_item(BookId::new(3), None).await.unwrap();
        ctl.confirm_payment().await.unwrap();
        assert_eq!(ctl.api().count("confirm_payment"), 1);

        ctl.checkout_cart().await.unwrap();
        ctl.confirm_payment().await.unwrap();
        assert_eq!(ctl.api().count("confirm_pix_payment"), 1);
    }

    #[tokio::test]
    async fn test_confirm_success_closes_panel_and_navigates() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.checkout_cart().await.unwrap();
        ctl.view_mut().clear();

        assert_eq!(ctl.confirm_payment().await.unwrap(), OrderId::new(55));
        assert_eq!(ctl.checkout_state(), &CheckoutState::Confirmed(OrderId::new(55)));
        assert!(!ctl.view().payment_panel_open());
        assert_eq!(ctl.view().navigations(), vec![Route::Profile]);
        assert_eq!(
            ctl.view().alerts(),
            vec!["✅ Pagamento confirmado! Aguardando aprovação do administrador."]
        );
    }

    #[tokio::test]
    async fn test_confirm_failure_keeps_panel_for_retry() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.checkout_cart().await.unwrap();
        ctl.api()
            .fail("confirm_pix_payment", Fail::Backend(404, "Pedido não encontrado"));

        assert!(ctl.confirm_payment().await.is_err());
        assert_eq!(ctl.view().alerts(), vec!["Pedido não encontrado"]);
        assert!(ctl.view().payment_panel_open());
        assert!(ctl.view().navigations().is_empty());
        assert!(ctl.checkout_state().pending().is_some());

        // Retrying the same order is allowed.
        ctl.api().heal("confirm_pix_payment");
        assert_eq!(ctl.confirm_payment().await.unwrap(), OrderId::new(55));
        assert_eq!(ctl.api().count("confirm_pix_payment"), 2);
    }

    #[tokio::test]
    async fn test_copy_payment_code() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        assert!(ctl.copy_payment_code().is_err());

        ctl.checkout_item(BookId::new(3), None).await.unwrap();
        ctl.copy_payment_code().unwrap();
        assert!(ctl
            .view()
            .events
            .contains(&ViewEvent::Copied("00020126single".to_string())));
        assert_eq!(ctl.view().alerts().last(), Some(&CODE_COPIED));

        ctl.view_mut().clipboard_error = Some("no clipboard".to_string());
        ctl.copy_payment_code().unwrap();
        assert_eq!(ctl.view().alerts().last(), Some(&COPY_FAILED));
    }

    // -------------------------------------------------------------------------
    // Account
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_caches_identity_and_returns_redirect() {
        let (_dir, mut ctl) = guest();
        ctl.set_location(Route::Book(BookId::new(9)));
        let _ = ctl.checkout_item(BookId::new(9), None).await;

        let email = Email::parse("a@b.com").unwrap();
        let redirect = ctl
            .login(&email, &SecretString::from("segredo"))
            .await
            .unwrap();

        assert_eq!(redirect.as_deref(), Some("/livro/9"));
        assert!(ctl.session().is_logged_in());
        assert_eq!(ctl.store.load(), Session::LoggedIn(identity()));
    }

    #[tokio::test]
    async fn test_logout_is_single_exit_point() {
        let (_dir, mut ctl) = logged_in(two_item_cart());
        ctl.store.store(&identity()).unwrap();
        ctl.checkout_item(BookId::new(3), None).await.unwrap();
        ctl.view_mut().clear();

        ctl.logout().unwrap();

        assert_eq!(ctl.session(), &Session::Anonymous);
        assert_eq!(ctl.store.load(), Session::Anonymous);
        assert_eq!(ctl.checkout_state(), &CheckoutState::NoOrder);
        assert!(!ctl.view().payment_panel_open());
        assert_eq!(ctl.view().last_cart().unwrap().badge, None);
        assert_eq!(ctl.view().navigations(), vec![Route::Home]);

        // Guests see no cart afterwards.
        let calls = ctl.api().calls().len();
        assert!(ctl.load_cart().await.unwrap().is_none());
        assert_eq!(ctl.api().calls().len(), calls);
    }

    #[tokio::test]
    async fn test_guest_profile_redirects() {
        let (_dir, mut ctl) = guest();
        assert!(ctl.show_profile().await.is_err());
        assert!(ctl.api().calls().is_empty());
        assert_eq!(ctl.view().navigations(), vec![Route::Login]);
    }
}
