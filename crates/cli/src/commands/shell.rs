//! Interactive page lifetime.
//!
//! One controller lives for the whole shell session, so a checkout started
//! with `buy` stays pending until `paid` or `close`, exactly like a page
//! that keeps its payment panel open.

use std::io::Write;
use std::str::FromStr;

use clicleitura_client::{CartCheckoutController, StorefrontApi};
use clicleitura_core::{BookId, CartItemId, Email};
use tokio::io::{AsyncBufRead, Lines};
use tracing::debug;

use crate::terminal::TerminalView;

const HELP: &str = "\
Comandos:
  cart            mostrar o carrinho
  open            abrir o carrinho
  add N           adicionar o livro N ao carrinho
  remove N        remover o item N do carrinho
  buy N [email]   comprar o livro N com PIX
  checkout        finalizar o carrinho com PIX
  paid            já paguei (confirmar pagamento)
  copy            copiar o código PIX
  close           fechar o pagamento
  profile         meu perfil e pedidos
  logout          sair
  quit            encerrar";

/// One line typed at the shell prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Cart,
    Open,
    Add(BookId),
    Remove(CartItemId),
    Buy(BookId, Option<Email>),
    Checkout,
    Paid,
    Copy,
    Close,
    Profile,
    Logout,
    Help,
    Quit,
}

/// Why a shell line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Comando desconhecido: {0} (digite help)")]
    Unknown(String),
    #[error("Uso: {0}")]
    Usage(&'static str),
}

impl FromStr for ShellCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Self::Help);
        };
        let arg = words.next();

        let command = match command {
            "cart" => Self::Cart,
            "open" => Self::Open,
            "add" => Self::Add(parse_arg(arg, "add N")?),
            "remove" => Self::Remove(parse_arg(arg, "remove N")?),
            "buy" => {
                let book_id = parse_arg(arg, "buy N [email]")?;
                let email = words
                    .next()
                    .map(Email::parse)
                    .transpose()
                    .map_err(|_| ParseError::Usage("buy N [email]"))?;
                Self::Buy(book_id, email)
            }
            "checkout" => Self::Checkout,
            "paid" => Self::Paid,
            "copy" => Self::Copy,
            "close" => Self::Close,
            "profile" => Self::Profile,
            "logout" => Self::Logout,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_arg<T: FromStr>(arg: Option<&str>, usage: &'static str) -> Result<T, ParseError> {
    arg.and_then(|a| a.parse().ok())
        .ok_or(ParseError::Usage(usage))
}

/// Run the shell until `quit` or end of input.
pub async fn run<A, W, R>(
    ctl: &mut CartCheckoutController<A, TerminalView<W>>,
    input: &mut Lines<R>,
) -> std::io::Result<()>
where
    A: StorefrontApi,
    W: Write,
    R: AsyncBufRead + Unpin,
{
    ctl.on_page_load().await;
    ctl.view_mut().line("Digite help para ver os comandos.");

    loop {
        ctl.view_mut().prompt("clicleitura> ");
        let Some(line) = input.next_line().await? else {
            break;
        };

        let command = match line.parse::<ShellCommand>() {
            Ok(command) => command,
            Err(e) => {
                ctl.view_mut().line(&e.to_string());
                continue;
            }
        };

        if command == ShellCommand::Quit {
            break;
        }
        dispatch(ctl, command).await;
    }

    if ctl.checkout_state().pending().is_some() {
        ctl.close_payment_panel();
    }
    Ok(())
}

/// Run one command. Failures were already shown by the controller.
pub async fn dispatch<A, W>(
    ctl: &mut CartCheckoutController<A, TerminalView<W>>,
    command: ShellCommand,
) where
    A: StorefrontApi,
    W: Write,
{
    let result = match command {
        ShellCommand::Cart => ctl.load_cart().await.map(|_| ()),
        ShellCommand::Open => ctl.open_cart(),
        ShellCommand::Add(book_id) => ctl.add_to_cart(book_id).await,
        ShellCommand::Remove(item_id) => ctl.remove_item(item_id).await,
        ShellCommand::Buy(book_id, email) => ctl.checkout_item(book_id, email).await.map(|_| ()),
        ShellCommand::Checkout => ctl.checkout_cart().await.map(|_| ()),
        ShellCommand::Paid => ctl.confirm_payment().await.map(|_| ()),
        ShellCommand::Copy => ctl.copy_payment_code(),
        ShellCommand::Close => {
            ctl.close_payment_panel();
            Ok(())
        }
        ShellCommand::Profile => ctl.show_profile().await.map(|_| ()),
        ShellCommand::Logout => ctl.logout(),
        ShellCommand::Help => {
            ctl.view_mut().line(HELP);
            Ok(())
        }
        ShellCommand::Quit => Ok(()),
    };

    if let Err(e) = result {
        debug!(error = %e, "Shell command failed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("cart".parse::<ShellCommand>(), Ok(ShellCommand::Cart));
        assert_eq!(" add 3 ".parse::<ShellCommand>(), Ok(ShellCommand::Add(BookId::new(3))));
        assert_eq!(
            "remove 1".parse::<ShellCommand>(),
            Ok(ShellCommand::Remove(CartItemId::new(1)))
        );
        assert_eq!("buy 3".parse::<ShellCommand>(), Ok(ShellCommand::Buy(BookId::new(3), None)));
        assert_eq!(
            "buy 3 a@b.com".parse::<ShellCommand>(),
            Ok(ShellCommand::Buy(BookId::new(3), Some(Email::parse("a@b.com").unwrap())))
        );
        assert_eq!("exit".parse::<ShellCommand>(), Ok(ShellCommand::Quit));
        assert_eq!("".parse::<ShellCommand>(), Ok(ShellCommand::Help));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "add".parse::<ShellCommand>(),
            Err(ParseError::Usage("add N"))
        );
        assert_eq!(
            "remove x".parse::<ShellCommand>(),
            Err(ParseError::Usage("remove N"))
        );
        assert_eq!(
            "buy 3 not-an-email".parse::<ShellCommand>(),
            Err(ParseError::Usage("buy N [email]"))
        );
        assert!(matches!(
            "dance".parse::<ShellCommand>(),
            Err(ParseError::Unknown(c)) if c == "dance"
        ));
    }
}
