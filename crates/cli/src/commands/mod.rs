//! CLI command implementations.

pub mod shell;

use std::io::Write;

use clicleitura_client::{CartCheckoutController, ClientError, StorefrontApi};
use clicleitura_core::Email;
use secrecy::SecretString;
use tokio::io::{AsyncBufRead, Lines};

use crate::terminal::TerminalView;
use shell::ShellCommand;

/// Keep the payment panel open until it is paid or closed.
///
/// Only `paid`, `copy` and `close` are accepted. End of input abandons the
/// order locally.
///
/// # Errors
///
/// Returns error if reading input fails.
pub async fn payment_prompt<A, W, R>(
    ctl: &mut CartCheckoutController<A, TerminalView<W>>,
    input: &mut Lines<R>,
) -> std::io::Result<()>
where
    A: StorefrontApi,
    W: Write,
    R: AsyncBufRead + Unpin,
{
    while ctl.checkout_state().pending().is_some() {
        ctl.view_mut().prompt("pagamento (paid/copy/close)> ");
        let Some(line) = input.next_line().await? else {
            ctl.close_payment_panel();
            break;
        };

        match line.parse::<ShellCommand>() {
            Ok(command @ (ShellCommand::Paid | ShellCommand::Copy | ShellCommand::Close)) => {
                shell::dispatch(ctl, command).await;
            }
            _ => ctl.view_mut().line("Digite paid, copy ou close."),
        }
    }
    Ok(())
}

/// Log in, then print where the user was headed.
///
/// # Errors
///
/// Returns error if the backend rejects the credentials.
pub async fn login<A, W>(
    ctl: &mut CartCheckoutController<A, TerminalView<W>>,
    email: &Email,
    password: &SecretString,
) -> Result<(), ClientError>
where
    A: StorefrontApi,
    W: Write,
{
    let redirect = ctl.login(email, password).await?;
    let name = ctl
        .session()
        .identity()
        .map(|identity| identity.first_name().to_string())
        .unwrap_or_default();

    let view = ctl.view_mut();
    view.line(&format!("✅ Bem-vindo(a), {name}!"));
    if let Some(path) = redirect {
        view.line(&format!("Continue de onde parou: {path}"));
    }
    Ok(())
}
