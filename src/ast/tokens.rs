#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer literal (sign is a separate unary operator)
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 18446744073709551615
    /// ```
    Integer(u64),

    /// Floating-point literal
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 1e9
    /// ```
    Float(f64),

    /// String literal in double quotes, single quotes or backticks
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'admin'
    /// `raw \n stays`
    /// ```
    String(String),

    /// `true` / `false`
    Boolean(bool),

    /// `nil` (also accepted: `null`)
    Nil,

    /// Parameter or function name
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    ///
    /// # Examples
    /// ```text
    /// user
    /// ID
    /// page_size
    /// ```
    Identifier(String),

    // Comparison
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,

    // Arithmetic
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*` (multiplication or dereference)
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,

    // Logical
    /// `&&`, or the word `and`
    AndAnd,
    /// `||`, or the word `or`
    OrOr,
    /// `&` (eager boolean and, or address-of)
    Ampersand,
    /// `|` (eager boolean or)
    Pipe,
    /// `!`
    Bang,
    /// `^` (bitwise complement)
    Caret,

    // Delimiters
    /// `.` member access
    Dot,
    Comma,
    /// `:` inside slice expressions
    Colon,
    LParen,
    RParen,
    LBracket,
    RBracket,

    /// End of input
    Eof,
}
