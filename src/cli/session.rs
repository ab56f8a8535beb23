use anyhow::Result;
use std::io::{BufRead, Write};
use std::ops::ControlFlow;

use crate::application::{AppError, CounterService};
use crate::domain::{format_cents, parse_quantity, Catalog, Removal};

use super::{write_menu, write_order, write_receipt};

const HELP: &str = "\
Commands:
  menu [text]             show the menu, or dishes matching text
  add <dish|#> [qty]      add dishes (quantity defaults to 1)
  remove <dish|#> [qty]   return dishes (quantity defaults to 1)
  order                   show the current order
  customer [name]         set or clear the customer name
  clear                   empty the order
  checkout [discount]     settle the order, e.g. 'checkout 0.8' or 'checkout 85%'
  help                    show this help
  quit                    leave the session";

/// One line typed at the counter prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Menu(Option<String>),
    Add { item: String, quantity: String },
    Remove { item: String, quantity: String },
    Order,
    Customer(Option<String>),
    Clear,
    Checkout(Option<String>),
    Help,
    Quit,
}

impl SessionCommand {
    /// Parse a prompt line. Blank lines yield `Ok(None)`.
    /// The catalog tells dish names that end in digits apart from quantities.
    pub fn parse(line: &str, catalog: &Catalog) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let rest = (!rest.is_empty()).then(|| rest.to_string());

        let command = match verb.to_lowercase().as_str() {
            "menu" | "m" => SessionCommand::Menu(rest),
            "add" | "a" => {
                let (item, quantity) = split_item_quantity(rest, "add", catalog)?;
                SessionCommand::Add { item, quantity }
            }
            "remove" | "r" => {
                let (item, quantity) = split_item_quantity(rest, "remove", catalog)?;
                SessionCommand::Remove { item, quantity }
            }
            "order" | "o" => SessionCommand::Order,
            "customer" => SessionCommand::Customer(rest),
            "clear" => SessionCommand::Clear,
            "checkout" | "pay" => SessionCommand::Checkout(rest),
            "help" | "?" => SessionCommand::Help,
            "quit" | "q" | "exit" => SessionCommand::Quit,
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(Some(command))
    }
}

/// Split "<dish> [qty]". Text naming a dish on its own is the whole dish name.
/// Otherwise the last word is the quantity when it contains a digit, so dish
/// names may contain spaces.
fn split_item_quantity(
    rest: Option<String>,
    verb: &str,
    catalog: &Catalog,
) -> Result<(String, String), String> {
    let rest = rest.ok_or_else(|| format!("Usage: {} <dish|#> [qty]", verb))?;

    if catalog.resolve(&rest).is_some() {
        return Ok((rest, "1".to_string()));
    }
    if let Some((item, last)) = rest.rsplit_once(char::is_whitespace) {
        if last.chars().any(|c| c.is_ascii_digit()) {
            return Ok((item.trim().to_string(), last.to_string()));
        }
    }
    Ok((rest, "1".to_string()))
}

/// Interactive counter session over any line-based input and output.
pub struct Session<'a, R, W> {
    service: &'a mut CounterService,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(service: &'a mut CounterService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    /// Read commands until `quit` or end of input.
    /// Ledger errors are reported as prompts to correct the input; the loop goes on.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Welcome to the counter. Type 'help' for commands.")?;
        write_menu(&mut self.output, self.service.catalog(), None)?;

        let mut line = String::new();
        loop {
            write!(self.output, "\n> ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            let command = match SessionCommand::parse(&line, self.service.catalog()) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    writeln!(self.output, "{}", message)?;
                    continue;
                }
            };

            match self.execute(command).await {
                Ok(ControlFlow::Continue(())) => {}
                Ok(ControlFlow::Break(())) => break,
                Err(AppError::Order(e)) => writeln!(self.output, "{}. Please try again.", e)?,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn execute(&mut self, command: SessionCommand) -> Result<ControlFlow<()>, AppError> {
        let out = &mut self.output;
        match command {
            SessionCommand::Menu(query) => {
                write_menu(out, self.service.catalog(), query.as_deref())?;
            }
            SessionCommand::Add { item, quantity } => {
                let quantity = parse_quantity(&quantity)?;
                let (name, total) = self.service.add_by_token(&item, quantity)?;
                writeln!(out, "Added {} x{} (now {})", name, quantity, total)?;
            }
            SessionCommand::Remove { item, quantity } => {
                let quantity = parse_quantity(&quantity)?;
                let (name, removal) = self.service.remove_by_token(&item, quantity)?;
                match removal {
                    Removal::Decremented { remaining } => {
                        writeln!(out, "Returned {} x{} ({} left)", name, quantity, remaining)
                    }
                    Removal::Removed => writeln!(out, "Removed {} from the order", name),
                }?;
            }
            SessionCommand::Order => {
                write_order(out, &self.service.order_snapshot())?;
            }
            SessionCommand::Customer(name) => {
                self.service.set_customer(name);
                match self.service.order_snapshot().customer {
                    Some(name) => writeln!(out, "Customer: {}", name),
                    None => writeln!(out, "Customer cleared"),
                }?;
            }
            SessionCommand::Clear => {
                self.service.clear_order();
                writeln!(out, "Order cleared")?;
            }
            SessionCommand::Checkout(discount) => {
                let result = self.service.settle(discount.as_deref()).await?;
                if let Some(warning) = &result.discount_warning {
                    writeln!(out, "Warning: {}. Charging full price.", warning)?;
                }
                write_receipt(out, &result.receipt)?;
                writeln!(
                    out,
                    "Paid {}. Thank you!",
                    format_cents(result.receipt.final_cents)
                )?;
            }
            SessionCommand::Help => {
                writeln!(out, "{}", HELP)?;
            }
            SessionCommand::Quit => {
                if !self.service.is_order_empty() {
                    writeln!(out, "Leaving with an unsettled order; it is discarded.")?;
                }
                writeln!(out, "Goodbye.")?;
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
