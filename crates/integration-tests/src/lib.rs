//! Integration tests for the ClicLeitura client.
//!
//! [`StubBackend`] serves the storefront's JSON API from memory on an
//! ephemeral port, so the real [`HttpApi`](clicleitura_client::HttpApi)
//! can be driven end to end without a live backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p clicleitura-integration-tests
//! ```
//!
//! # Seed Data
//!
//! - user 7, "Ana Souza", `a@b.com`, password `segredo`
//! - books 101 "Foo" (R$ 10.00), 102 "Bar" (R$ 9.98), 103 "Dom Casmurro" (R$ 25.50),
//!   104 "Iracema" (R$ 15.00, no image, served as `"imagem": null`)
//! - empty carts, no orders

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use clicleitura_client::ClientConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Base64 PNG signature, enough to exercise QR decoding.
pub const QR_BASE64: &str = "iVBORw0KGgo=";

/// Password accepted for every seeded user.
pub const PASSWORD: &str = "segredo";

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone)]
struct Book {
    title: &'static str,
    author: &'static str,
    centavos: i64,
    image: Option<&'static str>,
}

#[derive(Debug, Clone)]
struct User {
    id: i64,
    name: &'static str,
    email: &'static str,
}

#[derive(Debug, Clone)]
struct CartLine {
    id: i64,
    book_id: i64,
}

#[derive(Debug, Clone)]
struct Order {
    user_id: i64,
    book_ids: Vec<i64>,
    centavos: i64,
    status: &'static str,
}

/// Everything the stub backend knows.
#[derive(Debug)]
struct BackendState {
    books: HashMap<i64, Book>,
    users: Vec<User>,
    carts: HashMap<i64, Vec<CartLine>>,
    orders: HashMap<i64, Order>,
    next_cart_line: i64,
    next_order: i64,
    forced: HashMap<&'static str, (StatusCode, String)>,
    delay: Option<Duration>,
    requests: Vec<String>,
}

impl Default for BackendState {
    fn default() -> Self {
        let book = |title, author, centavos, image| Book {
            title,
            author,
            centavos,
            image,
        };
        Self {
            books: HashMap::from([
                (101, book("Foo", "X", 1000, Some("foo.jpg"))),
                (102, book("Bar", "Y", 998, Some("https://cdn.example.com/bar.jpg"))),
                (103, book("Dom Casmurro", "Machado de Assis", 2550, Some("dom.jpg"))),
                (104, book("Iracema", "José de Alencar", 1500, None)),
            ]),
            users: vec![User {
                id: 7,
                name: "Ana Souza",
                email: "a@b.com",
            }],
            carts: HashMap::new(),
            orders: HashMap::new(),
            next_cart_line: 1,
            next_order: 55,
            forced: HashMap::new(),
            delay: None,
            requests: Vec::new(),
        }
    }
}

impl BackendState {
    fn total(&self, book_ids: &[i64]) -> i64 {
        book_ids
            .iter()
            .filter_map(|id| self.books.get(id))
            .map(|book| book.centavos)
            .sum()
    }

    fn create_order(&mut self, user_id: i64, book_ids: Vec<i64>) -> (i64, i64) {
        let order_id = self.next_order;
        self.next_order += 1;
        let centavos = self.total(&book_ids);
        self.orders.insert(
            order_id,
            Order {
                user_id,
                book_ids,
                centavos,
                status: "PENDENTE",
            },
        );
        (order_id, centavos)
    }

    fn forced(&self, route: &str) -> Option<Response> {
        self.forced
            .get(route)
            .map(|(status, message)| error(*status, message))
    }
}

type Shared = Arc<Mutex<BackendState>>;

#[allow(clippy::unwrap_used)]
fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap()
}

#[allow(clippy::cast_precision_loss)]
fn reais(centavos: i64) -> f64 {
    centavos as f64 / 100.0
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let delay = {
        let mut state = lock(&state);
        state
            .requests
            .push(format!("{} {}", request.method(), request.uri().path()));
        state.delay
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    next.run(request).await
}

async fn fetch_cart(State(state): State<Shared>, Path(user_id): Path<i64>) -> Response {
    let state = lock(&state);
    if let Some(forced) = state.forced("cart") {
        return forced;
    }

    let lines = state.carts.get(&user_id).cloned().unwrap_or_default();
    let items: Vec<Value> = lines
        .iter()
        .filter_map(|line| {
            let book = state.books.get(&line.book_id)?;
            Some(json!({
                "id": line.id,
                "livro_id": line.book_id,
                "titulo": book.title,
                "autor": book.author,
                "preco": reais(book.centavos),
                "imagem": book.image,
            }))
        })
        .collect();
    let book_ids: Vec<i64> = lines.iter().map(|line| line.book_id).collect();

    Json(json!({ "itens": items, "total": reais(state.total(&book_ids)) })).into_response()
}

async fn remove_item(State(state): State<Shared>, Path(item_id): Path<i64>) -> Response {
    let mut state = lock(&state);
    if let Some(forced) = state.forced("remove") {
        return forced;
    }

    for lines in state.carts.values_mut() {
        if let Some(pos) = lines.iter().position(|line| line.id == item_id) {
            lines.remove(pos);
            return Json(json!({})).into_response();
        }
    }
    error(StatusCode::NOT_FOUND, "Item não encontrado no carrinho")
}

#[derive(Deserialize)]
struct AddToCart {
    usuario_id: i64,
    livro_id: i64,
}

async fn add_to_cart(State(state): State<Shared>, Json(body): Json<AddToCart>) -> Response {
    let mut state = lock(&state);
    if let Some(forced) = state.forced("add") {
        return forced;
    }
    if !state.books.contains_key(&body.livro_id) {
        return error(StatusCode::NOT_FOUND, "Livro não encontrado");
    }

    let line_id = state.next_cart_line;
    let lines = state.carts.entry(body.usuario_id).or_default();
    if lines.iter().any(|line| line.book_id == body.livro_id) {
        return error(StatusCode::BAD_REQUEST, "Este livro já está no seu carrinho");
    }
    lines.push(CartLine {
        id: line_id,
        book_id: body.livro_id,
    });
    state.next_cart_line += 1;
    Json(json!({ "message": "Livro adicionado ao carrinho" })).into_response()
}

#[derive(Deserialize)]
struct Checkout {
    livro_id: i64,
    email: String,
    usuario_id: i64,
}

async fn checkout(State(state): State<Shared>, Json(body): Json<Checkout>) -> Response {
    let mut state = lock(&state);
    if let Some(forced) = state.forced("checkout") {
        return forced;
    }
    if body.email.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Email é obrigatório");
    }
    if !state.books.contains_key(&body.livro_id) {
        return error(StatusCode::NOT_FOUND, "Livro não encontrado");
    }

    let (order_id, _) = state.create_order(body.usuario_id, vec![body.livro_id]);
    Json(json!({
        "pedido_id": order_id,
        "qr_base64": QR_BASE64,
        "pix_text": format!("00020126pedido{order_id}"),
    }))
    .into_response()
}

#[derive(Deserialize)]
struct FinalizeCart {
    usuario_id: i64,
    email: String,
}

async fn finalize_cart(State(state): State<Shared>, Json(body): Json<FinalizeCart>) -> Response {
    let mut state = lock(&state);
    if let Some(forced) = state.forced("finalize") {
        return forced;
    }
    if body.email.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Email é obrigatório");
    }

    let lines = state.carts.remove(&body.usuario_id).unwrap_or_default();
    if lines.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Carrinho vazio");
    }

    let book_ids: Vec<i64> = lines.iter().map(|line| line.book_id).collect();
    let titles: Vec<&'static str> = book_ids
        .iter()
        .filter_map(|id| state.books.get(id).map(|book| book.title))
        .collect();
    let count = book_ids.len();
    let (order_id, centavos) = state.create_order(body.usuario_id, book_ids);

    Json(json!({
        "pedido_id": order_id,
        "total": reais(centavos),
        "quantidade": count,
        "qr_base64": QR_BASE64,
        "pix_text": format!("00020126carrinho{order_id}"),
        "livros": titles,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct ConfirmOrder {
    pedido_id: i64,
}

fn mark_awaiting_approval(state: &mut BackendState, order_id: i64) -> Option<()> {
    let order = state.orders.get_mut(&order_id)?;
    if order.status == "PENDENTE" {
        order.status = "PENDENTE_APROVACAO";
    }
    Some(())
}

async fn confirm_simple(State(state): State<Shared>, Json(body): Json<ConfirmOrder>) -> Response {
    let mut state = lock(&state);
    if let Some(forced) = state.forced("confirm") {
        return forced;
    }
    match mark_awaiting_approval(&mut state, body.pedido_id) {
        Some(()) => Json(json!({})).into_response(),
        None => error(StatusCode::NOT_FOUND, "Pedido não encontrado"),
    }
}

async fn confirm_pix(State(state): State<Shared>, Json(body): Json<ConfirmOrder>) -> Response {
    let mut state = lock(&state);
    if let Some(forced) = state.forced("confirm-pix") {
        return forced;
    }
    match mark_awaiting_approval(&mut state, body.pedido_id) {
        Some(()) => Json(json!({
            "message": "Pagamento confirmado! Aguardando aprovação do administrador."
        }))
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "Pedido não encontrado"),
    }
}

#[derive(Deserialize)]
struct Login {
    email: String,
    senha: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<Login>) -> Response {
    let state = lock(&state);
    let user = state
        .users
        .iter()
        .find(|user| user.email == body.email && body.senha == PASSWORD);

    match user {
        Some(user) => Json(json!({
            "message": "Login realizado com sucesso",
            "usuario": { "id": user.id, "nome": user.name, "email": user.email },
        }))
        .into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Email ou senha incorretos"),
    }
}

async fn profile(State(state): State<Shared>, Path(user_id): Path<i64>) -> Response {
    let state = lock(&state);
    let Some(user) = state.users.iter().find(|user| user.id == user_id) else {
        return error(StatusCode::NOT_FOUND, "Usuário não encontrado");
    };

    let mut orders: Vec<(&i64, &Order)> = state
        .orders
        .iter()
        .filter(|(_, order)| order.user_id == user_id)
        .collect();
    orders.sort_by_key(|(id, _)| std::cmp::Reverse(**id));

    let paid: Vec<&&Order> = orders
        .iter()
        .map(|(_, order)| order)
        .filter(|order| order.status == "PAGO")
        .collect();
    let pending = orders
        .iter()
        .filter(|(_, order)| order.status.starts_with("PENDENTE"))
        .count();

    let rows: Vec<Value> = orders
        .iter()
        .map(|(id, order)| {
            let title = (order.book_ids.len() == 1)
                .then(|| order.book_ids.first().and_then(|b| state.books.get(b)))
                .flatten()
                .map(|book| book.title);
            json!({
                "id": id,
                "titulo": title,
                "preco": reais(order.centavos),
                "status": order.status,
                "data": "2024-03-02 11:00:00",
            })
        })
        .collect();

    Json(json!({
        "usuario": {
            "id": user.id,
            "nome": user.name,
            "email": user.email,
            "membro_desde": "2024-03-01 10:00:00",
        },
        "stats": {
            "total_pedidos": orders.len(),
            "pedidos_pagos": paid.len(),
            "pedidos_pendentes": pending,
            "total_gasto": reais(paid.iter().map(|order| order.centavos).sum()),
        },
        "pedidos": rows,
    }))
    .into_response()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/carrinho/{user_id}", get(fetch_cart))
        .route("/api/carrinho/remover/{item_id}", delete(remove_item))
        .route("/api/carrinho/adicionar", post(add_to_cart))
        .route("/api/carrinho/finalizar-pix", post(finalize_cart))
        .route("/api/checkout", post(checkout))
        .route("/api/confirmar_pagamento", post(confirm_simple))
        .route("/api/confirmar-pagamento-pix", post(confirm_pix))
        .route("/api/login", post(login))
        .route("/api/perfil/{user_id}", get(profile))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

// =============================================================================
// Harness
// =============================================================================

/// In-memory storefront backend on `127.0.0.1:<ephemeral>`.
pub struct StubBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl StubBackend {
    /// Bind and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::default()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener.local_addr().expect("Stub backend has no address");

        let app = router(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// `http://127.0.0.1:<port>`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url()).expect("Stub backend URL is valid")
    }

    /// Put `book_ids` in `user_id`'s cart, returning the cart item ids.
    pub fn seed_cart(&self, user_id: i64, book_ids: &[i64]) -> Vec<i64> {
        let mut state = lock(&self.state);
        let mut ids = Vec::with_capacity(book_ids.len());
        for &book_id in book_ids {
            let id = state.next_cart_line;
            state.next_cart_line += 1;
            state
                .carts
                .entry(user_id)
                .or_default()
                .push(CartLine { id, book_id });
            ids.push(id);
        }
        ids
    }

    /// Make every call to `route` fail with `status` and `{"error": message}`.
    ///
    /// Routes: `cart`, `remove`, `add`, `checkout`, `finalize`, `confirm`,
    /// `confirm-pix`.
    pub fn force_error(&self, route: &'static str, status: u16, message: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        lock(&self.state)
            .forced
            .insert(route, (status, message.to_string()));
    }

    /// Hold every response for `delay` after recording the request.
    pub fn stall(&self, delay: Duration) {
        lock(&self.state).delay = Some(delay);
    }

    /// Undo [`force_error`](Self::force_error).
    pub fn clear_error(&self, route: &str) {
        lock(&self.state).forced.remove(route);
    }

    /// Requests served so far, as `METHOD /path`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// Status of an order, if it exists.
    #[must_use]
    pub fn order_status(&self, order_id: i64) -> Option<&'static str> {
        lock(&self.state).orders.get(&order_id).map(|order| order.status)
    }

    /// Mark an order as paid, as the admin would.
    pub fn approve(&self, order_id: i64) {
        if let Some(order) = lock(&self.state).orders.get_mut(&order_id) {
            order.status = "PAGO";
        }
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// An address nothing listens on.
///
/// # Panics
///
/// Panics if no port can be reserved.
pub async fn unreachable_config() -> ClientConfig {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to reserve a port");
    let addr = listener.local_addr().expect("Listener has no address");
    drop(listener);
    ClientConfig::new(&format!("http://{addr}")).expect("URL is valid")
}
