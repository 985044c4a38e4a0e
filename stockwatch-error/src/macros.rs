/// Немедленно возвращает ошибку (аналогично `anyhow::bail!`).
///
/// Формы:
/// - `bail!(err)` — готовая ошибка, совместимая со `StackError`;
/// - `bail!(code, "msg")` — `GenericError` с кодом и сообщением;
/// - `bail!(code, "fmt {}", arg)` — форматированное сообщение.
///
/// ```ignore
/// use stockwatch_error::{bail, StatusCode};
///
/// fn validate_item(item: &str) -> stockwatch_error::StockwatchResult<()> {
///     if item.is_empty() {
///         bail!(StatusCode::InvalidConfig, "item name cannot be empty");
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::StackError::from($err))
    };
    ($code:expr, $msg:expr) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, $msg)
        ))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::StackError::new(
            $crate::types::GenericError::new($code, format!($fmt, $($arg)*))
        ))
    };
}

/// Проверяет условие и вызывает `bail!`, если оно ложно.
///
/// Формы совпадают с `bail!`, первым аргументом идёт условие.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            $crate::bail!($err);
        }
    };
    ($cond:expr, $code:expr, $msg:expr) => {
        if !($cond) {
            $crate::bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($code, $fmt, $($arg)*);
        }
    };
}
