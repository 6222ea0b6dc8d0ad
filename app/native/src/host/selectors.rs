//! Typed wrappers over the raw host selectors.
//!
//! Each helper issues one query and decodes the reply into a Rust type, turning
//! unexpected reply types into [`HostError::UnexpectedType`].

use super::{HostError, HostResult, QueryArg, QueryTarget, QueryValue, ReturnType, WindowHost};
use crate::tiling::state::{ObjectRef, Pid, Rect};

// ============================================================================
// Selector Names
// ============================================================================

pub const APPLICATION_CLASS: &str = "NSApplication";
pub const SCREEN_CLASS: &str = "NSScreen";

pub const SHARED_APPLICATION: &str = "sharedApplication";
pub const WINDOWS: &str = "windows";
pub const IS_VISIBLE: &str = "isVisible";
pub const IS_MINIATURIZED: &str = "isMiniaturized";
pub const FRAME: &str = "frame";
pub const CAN_BECOME_KEY_WINDOW: &str = "canBecomeKeyWindow";
pub const STYLE_MASK: &str = "styleMask";
pub const WINDOW_NUMBER: &str = "windowNumber";
pub const SCREENS: &str = "screens";
pub const VISIBLE_FRAME: &str = "visibleFrame";
pub const SET_FRAME: &str = "setFrame:display:animate:";

/// Style mask bit marking a window as resizable.
pub const STYLE_MASK_RESIZABLE: u64 = 1 << 3;

// ============================================================================
// Reply Decoding
// ============================================================================

fn unexpected(selector: &str, expected: ReturnType, found: &QueryValue) -> HostError {
    HostError::UnexpectedType {
        selector: selector.to_string(),
        expected,
        found: found.kind(),
    }
}

fn expect_bool(selector: &str, value: QueryValue) -> HostResult<bool> {
    match value {
        QueryValue::Bool(flag) => Ok(flag),
        QueryValue::Int(n) => Ok(n != 0),
        QueryValue::UInt(n) => Ok(n != 0),
        other => Err(unexpected(selector, ReturnType::Bool, &other)),
    }
}

fn expect_rect(selector: &str, value: QueryValue) -> HostResult<Rect> {
    match value {
        QueryValue::Rect(rect) => Ok(rect),
        QueryValue::Null => Err(HostError::NullResult { selector: selector.to_string() }),
        other => Err(unexpected(selector, ReturnType::Rect, &other)),
    }
}

fn expect_objects(selector: &str, value: QueryValue) -> HostResult<Vec<ObjectRef>> {
    match value {
        QueryValue::Objects(objects) => Ok(objects),
        QueryValue::Object(object) => Ok(vec![object]),
        QueryValue::Null => Ok(Vec::new()),
        other => Err(unexpected(selector, ReturnType::Object, &other)),
    }
}

async fn query_object<H: WindowHost + ?Sized>(
    host: &H,
    pid: Pid,
    object: ObjectRef,
    selector: &'static str,
    returns: ReturnType,
) -> HostResult<QueryValue> {
    host.query(pid, QueryTarget::Object(object), selector, Vec::new(), returns).await
}

// ============================================================================
// Application
// ============================================================================

/// The process's shared application object.
///
/// # Errors
///
/// Returns an error if the query fails or the process has no application object.
pub async fn shared_application<H: WindowHost + ?Sized>(host: &H, pid: Pid) -> HostResult<ObjectRef> {
    let value = host
        .query(
            pid,
            QueryTarget::Class(APPLICATION_CLASS),
            SHARED_APPLICATION,
            Vec::new(),
            ReturnType::Object,
        )
        .await?;

    match value {
        QueryValue::Object(app) => Ok(app),
        QueryValue::Null => Err(HostError::NullResult { selector: SHARED_APPLICATION.to_string() }),
        other => Err(unexpected(SHARED_APPLICATION, ReturnType::Object, &other)),
    }
}

/// Windows owned by an application object. A nil reply is an empty list.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn windows<H: WindowHost + ?Sized>(
    host: &H,
    pid: Pid,
    app: ObjectRef,
) -> HostResult<Vec<ObjectRef>> {
    let value = query_object(host, pid, app, WINDOWS, ReturnType::Object).await?;
    expect_objects(WINDOWS, value)
}

// ============================================================================
// Window Attributes
// ============================================================================

/// # Errors
///
/// Returns an error if the query fails.
pub async fn is_visible<H: WindowHost + ?Sized>(host: &H, pid: Pid, window: ObjectRef) -> HostResult<bool> {
    let value = query_object(host, pid, window, IS_VISIBLE, ReturnType::Bool).await?;
    expect_bool(IS_VISIBLE, value)
}

/// # Errors
///
/// Returns an error if the query fails.
pub async fn is_minimized<H: WindowHost + ?Sized>(host: &H, pid: Pid, window: ObjectRef) -> HostResult<bool> {
    let value = query_object(host, pid, window, IS_MINIATURIZED, ReturnType::Bool).await?;
    expect_bool(IS_MINIATURIZED, value)
}

/// # Errors
///
/// Returns an error if the query fails.
pub async fn can_become_key<H: WindowHost + ?Sized>(
    host: &H,
    pid: Pid,
    window: ObjectRef,
) -> HostResult<bool> {
    let value = query_object(host, pid, window, CAN_BECOME_KEY_WINDOW, ReturnType::Bool).await?;
    expect_bool(CAN_BECOME_KEY_WINDOW, value)
}

/// # Errors
///
/// Returns an error if the query fails or the window has no frame.
pub async fn frame<H: WindowHost + ?Sized>(host: &H, pid: Pid, window: ObjectRef) -> HostResult<Rect> {
    let value = query_object(host, pid, window, FRAME, ReturnType::Rect).await?;
    expect_rect(FRAME, value)
}

/// Raw style mask bits of a window.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn style_mask<H: WindowHost + ?Sized>(host: &H, pid: Pid, window: ObjectRef) -> HostResult<u64> {
    let value = query_object(host, pid, window, STYLE_MASK, ReturnType::UInt).await?;
    match value {
        QueryValue::UInt(mask) => Ok(mask),
        QueryValue::Int(mask) => Ok(mask.cast_unsigned()),
        other => Err(unexpected(STYLE_MASK, ReturnType::UInt, &other)),
    }
}

/// Whether a style mask has the resizable bit set.
#[must_use]
pub const fn is_resizable(style_mask: u64) -> bool { style_mask & STYLE_MASK_RESIZABLE != 0 }

/// Host-assigned window number.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn window_number<H: WindowHost + ?Sized>(host: &H, pid: Pid, window: ObjectRef) -> HostResult<i64> {
    let value = query_object(host, pid, window, WINDOW_NUMBER, ReturnType::Int).await?;
    match value {
        QueryValue::Int(number) => Ok(number),
        QueryValue::UInt(number) => Ok(number.cast_signed()),
        other => Err(unexpected(WINDOW_NUMBER, ReturnType::Int, &other)),
    }
}

// ============================================================================
// Screens
// ============================================================================

/// Screens as seen by a process, in enumeration order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn screens<H: WindowHost + ?Sized>(host: &H, pid: Pid) -> HostResult<Vec<ObjectRef>> {
    let value = host
        .query(pid, QueryTarget::Class(SCREEN_CLASS), SCREENS, Vec::new(), ReturnType::Object)
        .await?;
    expect_objects(SCREENS, value)
}

/// Usable frame of a screen.
///
/// # Errors
///
/// Returns an error if the query fails or the screen has no frame.
pub async fn visible_frame<H: WindowHost + ?Sized>(host: &H, pid: Pid, screen: ObjectRef) -> HostResult<Rect> {
    let value = query_object(host, pid, screen, VISIBLE_FRAME, ReturnType::Rect).await?;
    expect_rect(VISIBLE_FRAME, value)
}

// ============================================================================
// Commands
// ============================================================================

/// Moves and resizes a window.
///
/// # Errors
///
/// Returns an error if the command could not be delivered.
pub async fn set_frame<H: WindowHost + ?Sized>(
    host: &H,
    pid: Pid,
    window: ObjectRef,
    frame: Rect,
    animate: bool,
) -> HostResult<()> {
    let args = vec![QueryArg::Rect(frame), QueryArg::Bool(true), QueryArg::Bool(animate)];
    host.command(pid, QueryTarget::Object(window), SET_FRAME, args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_resizable() {
        assert!(is_resizable(15));
        assert!(is_resizable(STYLE_MASK_RESIZABLE));
        assert!(!is_resizable(7));
        assert!(!is_resizable(0));
    }

    #[test]
    fn test_expect_objects_null_is_empty() {
        assert_eq!(expect_objects(WINDOWS, QueryValue::Null), Ok(Vec::new()));
        assert_eq!(expect_objects(WINDOWS, QueryValue::Object(ObjectRef(3))), Ok(vec![ObjectRef(3)]));
        assert!(matches!(
            expect_objects(WINDOWS, QueryValue::Bool(true)),
            Err(HostError::UnexpectedType { .. })
        ));
    }

    #[test]
    fn test_expect_rect_null_is_error() {
        assert_eq!(
            expect_rect(FRAME, QueryValue::Null),
            Err(HostError::NullResult { selector: FRAME.to_string() })
        );
    }

    #[test]
    fn test_expect_bool_accepts_integers() {
        assert_eq!(expect_bool(IS_VISIBLE, QueryValue::Int(1)), Ok(true));
        assert_eq!(expect_bool(IS_VISIBLE, QueryValue::UInt(0)), Ok(false));
    }
}
