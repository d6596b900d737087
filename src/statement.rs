//! Parsing and execution of the two supported statements and the
//! meta-commands.

use std::io::{self, Write};

use thiserror::Error;

use crate::{
    COLUMN_EMAIL_SIZE, COLUMN_USERNAME_SIZE,
    error::{DbError, Result},
    row::Row,
    table::Table,
};

// Non-SQL statements like .exit are called “meta-commands”.
#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Unrecognized(String),
}

impl MetaCommand {
    pub fn parse(input: &str) -> Option<MetaCommand> {
        match input {
            ".exit" => Some(MetaCommand::Exit),
            _ if input.starts_with('.') => Some(MetaCommand::Unrecognized(input.to_string())),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrepareError {
    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,

    #[error("String is too long.")]
    StringTooLong,

    #[error("ID must be positive.")]
    NegativeId,

    #[error("Unrecognized command: {0}")]
    Unrecognized(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

impl Statement {
    pub fn prepare(input: &str) -> std::result::Result<Statement, PrepareError> {
        let mut tokens = input.split_whitespace();
        match tokens.next() {
            Some("insert") => Self::prepare_insert(tokens),
            Some("select") if tokens.next().is_none() => Ok(Statement::Select),
            _ => Err(PrepareError::Unrecognized(input.to_string())),
        }
    }

    fn prepare_insert<'a>(
        mut args: impl Iterator<Item = &'a str>,
    ) -> std::result::Result<Statement, PrepareError> {
        let (Some(id), Some(username), Some(email)) = (args.next(), args.next(), args.next())
        else {
            return Err(PrepareError::SyntaxError);
        };

        let id = parse_id(id)?;

        if username.len() > COLUMN_USERNAME_SIZE || email.len() > COLUMN_EMAIL_SIZE {
            return Err(PrepareError::StringTooLong);
        }

        Ok(Statement::Insert(Row::new(id, username, email)))
    }

    /// Runs the statement and writes its user-facing output. Only I/O and
    /// storage failures are returned; a full table is reported to `out`.
    pub fn execute<W: Write>(&self, table: &mut Table, out: &mut W) -> Result<()> {
        match self {
            Statement::Insert(row) => match table.insert(row) {
                Ok(()) => writeln!(out, "Executed.")?,
                Err(e) if !e.is_fatal() => writeln!(out, "Error: {e}")?,
                Err(e) => return Err(e),
            },
            Statement::Select => {
                if table.is_empty() {
                    writeln!(out, "Empty table.")?;
                }
                for row in table.select() {
                    writeln!(out, "{}", row?)?;
                }
                writeln!(out, "Executed.")?;
            }
        }
        Ok(())
    }
}

/// Any well-formed number that is zero or negative, however large, is
/// reported as `NegativeId`.
fn parse_id(token: &str) -> std::result::Result<u32, PrepareError> {
    let is_number = |digits: &str| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());

    if let Some(digits) = token.strip_prefix('-') {
        return Err(if is_number(digits) {
            PrepareError::NegativeId
        } else {
            PrepareError::SyntaxError
        });
    }
    if !is_number(token) {
        return Err(PrepareError::SyntaxError);
    }

    match token.parse::<u32>() {
        Ok(0) => Err(PrepareError::NegativeId),
        Ok(id) => Ok(id),
        Err(_) => Err(PrepareError::SyntaxError),
    }
}

/// Flushes stdout after the prompt since it has no trailing newline.
pub fn print_prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "db > ")?;
    out.flush()
}
