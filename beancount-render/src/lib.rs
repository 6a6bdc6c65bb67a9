use beancount_core::*;
use std::{io, io::Write};
use thiserror::Error;


#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct BasicRenderer {}

impl BasicRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn render<W: Write>(w: &mut W, ledger: &Ledger<'_>) -> Result<(), BasicRendererError> {
    BasicRenderer::default().render(ledger, w)
}

/// Renders a sequence of directives, separated by blank lines, without building a [`Ledger`].
pub fn render_directives<W: Write>(
    w: &mut W,
    directives: &[Directive<'_>],
) -> Result<(), BasicRendererError> {
    let renderer = BasicRenderer::default();
    for directive in directives {
        renderer.render(directive, w)?;
        writeln!(w)?;
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum BasicRendererError {
    #[error("an io error occurred")]
    Io(#[from] io::Error),
}

pub trait Renderer<T, W: Write> {
    type Error;
    fn render(&self, renderable: T, write: &mut W) -> Result<(), Self::Error>;
}

impl<'a, W: Write> Renderer<&'a Ledger<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, ledger: &'a Ledger<'_>, write: &mut W) -> Result<(), Self::Error> {
        render_directives(write, &ledger.directives)
    }
}

impl<'a, W: Write> Renderer<&'a Directive<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, directive: &'a Directive<'_>, write: &mut W) -> Result<(), Self::Error> {
        use Directive::*;
        match directive {
            Open(open) => self.render(open, write),
            Pad(pad) => self.render(pad, write),
            Balance(balance) => self.render(balance, write),
            Transaction(transaction) => self.render(transaction, write),
        }
    }
}

/// Writes `s` as a double-quoted Beancount string.
fn write_quoted<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    write!(w, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(w, "\\\"")?,
            '\\' => write!(w, "\\\\")?,
            _ => write!(w, "{}", c)?,
        }
    }
    write!(w, "\"")
}

fn render_key_value<W: Write>(
    renderer: &BasicRenderer,
    w: &mut W,
    indent: &str,
    kv: &Meta<'_>,
) -> Result<(), BasicRendererError> {
    for (key, value) in kv {
        write!(w, "{}{}: ", indent, key)?;
        renderer.render(value, w)?;
        writeln!(w)?;
    }
    Ok(())
}

impl<'a, W: Write> Renderer<&'a MetaValue<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, mv: &'a MetaValue<'_>, w: &mut W) -> Result<(), Self::Error> {
        match mv {
            MetaValue::Account(account) => self.render(account, w)?,
            MetaValue::Number(num) => write!(w, "{}", num)?,
            MetaValue::Text(t) => write_quoted(w, t)?,
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Open<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, open: &'a Open<'_>, write: &mut W) -> Result<(), Self::Error> {
        write!(write, "{} open ", open.date)?;
        self.render(&open.account, write)?;
        if !open.currencies.is_empty() {
            write!(write, " {}", open.currencies.join(","))?;
        }
        writeln!(write)?;
        render_key_value(self, write, "\t", &open.meta)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Account<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, account: &'a Account<'_>, write: &mut W) -> Result<(), Self::Error> {
        write!(write, "{}", account)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Balance<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, balance: &'a Balance<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{} balance ", balance.date)?;
        self.render(&balance.account, w)?;
        write!(w, "\t")?;
        self.render(&balance.amount, w)?;
        writeln!(w)?;
        render_key_value(self, w, "\t", &balance.meta)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Amount<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, amount: &'a Amount<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{} {}", amount.num, amount.currency)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Pad<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, pad: &'a Pad<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{} pad ", pad.date)?;
        self.render(&pad.pad_to_account, w)?;
        write!(w, " ")?;
        self.render(&pad.pad_from_account, w)?;
        writeln!(w)?;
        render_key_value(self, w, "\t", &pad.meta)
    }
}

impl<'a, W: Write> Renderer<&'a Transaction<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, transaction: &'a Transaction<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{} {}", transaction.date, transaction.flag)?;
        if let Some(payee) = &transaction.payee {
            write!(w, " ")?;
            write_quoted(w, payee)?;
        }
        write!(w, " ")?;
        write_quoted(w, &transaction.narration)?;
        for tag in &transaction.tags {
            write!(w, " #{}", tag)?;
        }
        for link in &transaction.links {
            write!(w, " ^{}", link)?;
        }
        writeln!(w)?;
        render_key_value(self, w, "\t", &transaction.meta)?;
        for posting in &transaction.postings {
            self.render(posting, w)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Posting<'_>, W> for BasicRenderer {
    type Error = BasicRendererError;
    fn render(&self, posting: &'a Posting<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "\t")?;
        if let Some(flag) = &posting.flag {
            write!(w, "{} ", flag)?;
        }
        self.render(&posting.account, w)?;
        write!(w, "\t")?;
        self.render(&posting.units, w)?;
        if let Some(price) = &posting.price {
            write!(w, " @ ")?;
            self.render(price, w)?;
        }
        writeln!(w)?;
        render_key_value(self, w, "\t\t", &posting.meta)
    }
}
