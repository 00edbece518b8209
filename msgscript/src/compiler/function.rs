use msgscript_data::Token;
use thiserror::Error;

use super::{FailureKind, Outcome, Session};
use crate::syntax::{Rule, SyntaxNode};

/// An integer literal that is neither decimal nor `0x` hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntLiteralError {
    #[error("'{0}' is not a hexadecimal number")]
    Hex(String),
    #[error("'{0}' is not a decimal number")]
    Decimal(String),
}

/// Decode the text of an integer literal token.
///
/// `0x`-prefixed text is unsigned hexadecimal of up to 32 bits; anything else
/// is a signed 32-bit decimal. The value is then narrowed to 16 bits by
/// keeping the low half, so `0x12345` becomes `0x2345` and `40000` wraps to
/// `-25536`.
///
/// # Errors
/// Returns [`IntLiteralError`] when the digits do not parse.
pub fn parse_int_literal(text: &str) -> Result<i16, IntLiteralError> {
    let wide = if let Some(digits) = text.strip_prefix("0x") {
        // from_str_radix would accept a leading '+'
        if digits.starts_with(['+', '-']) {
            return Err(IntLiteralError::Hex(text.to_string()));
        }
        u32::from_str_radix(digits, 16).map_err(|_| IntLiteralError::Hex(text.to_string()))? as i32
    } else {
        text.parse::<i32>().map_err(|_| IntLiteralError::Decimal(text.to_string()))?
    };
    Ok(wide as i16)
}

impl Session<'_> {
    /// Compile `<f table function args...>` into a function token.
    pub(crate) fn compile_function_tag(&mut self, tag: &SyntaxNode<'_>) -> Outcome<Token> {
        self.trace(tag);
        let literals = self.required_all(tag, Rule::int_literal, "Expected function tag arguments")?;

        let table_node = self.required_at(tag, &literals, 0, "Expected function table index")?;
        let table_index = self.int_literal(&table_node)?;
        let function_node = self.required_at(tag, &literals, 1, "Expected function index")?;
        let function_index = self.int_literal(&function_node)?;

        let mut arguments = Vec::with_capacity(literals.len().saturating_sub(2));
        for node in literals.iter().skip(2) {
            arguments.push(self.int_literal(node)?);
        }

        Ok(Token::Function {
            table_index,
            function_index,
            arguments,
        })
    }

    pub(crate) fn int_literal(&mut self, node: &SyntaxNode<'_>) -> Outcome<i16> {
        parse_int_literal(node.text()).map_err(|e| {
            self.fail(
                FailureKind::MalformedIntegerLiteral,
                format!("Invalid integer format: {e}"),
                node.position(),
            )
        })
    }
}
