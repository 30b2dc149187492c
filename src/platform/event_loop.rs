//! Main-thread OS event pump.
//!
//! On macOS and Windows `global-hotkey` only delivers presses while the
//! thread that created the `GlobalHotKeyManager` pumps native events. The
//! binary creates the manager on the main thread, hands its async work to
//! the tokio runtime and pumps here until that work finishes. Elsewhere the
//! manager runs its own listener thread and this is a plain `block_on`.

use std::future::Future;
use tokio::runtime::Runtime;
use tokio::task::JoinError;

/// Runs `future` on `runtime` while the calling thread pumps OS events.
pub fn block_on_pumping<F>(runtime: &Runtime, future: F) -> Result<F::Output, JoinError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    imp::block_on_pumping(runtime, future)
}

#[cfg(target_os = "windows")]
mod imp {
    use super::*;
    use tracing::debug;
    use windows_sys::Win32::System::Threading::GetCurrentThreadId;
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW, TranslateMessage, MSG,
        PM_NOREMOVE, WM_QUIT,
    };

    /// Ends the message loop however the task finishes, panics included.
    struct QuitOnDrop(u32);

    impl Drop for QuitOnDrop {
        fn drop(&mut self) {
            unsafe { PostThreadMessageW(self.0, WM_QUIT, 0, 0) };
        }
    }

    pub(super) fn block_on_pumping<F>(runtime: &Runtime, future: F) -> Result<F::Output, JoinError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let mut msg: MSG = unsafe { std::mem::zeroed() };
        // Make sure the queue exists before anyone posts WM_QUIT to it.
        unsafe { PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_NOREMOVE) };
        let thread_id = unsafe { GetCurrentThreadId() };

        let task = runtime.spawn(async move {
            let _quit = QuitOnDrop(thread_id);
            future.await
        });

        debug!("pumping Windows messages");
        loop {
            let ret = unsafe { GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) };
            if ret <= 0 {
                break;
            }
            unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        runtime.block_on(task)
    }
}

#[cfg(target_os = "macos")]
mod imp {
    use super::*;
    use core_foundation::runloop::{kCFRunLoopDefaultMode, kCFRunLoopRunFinished, CFRunLoop};
    use std::thread;
    use std::time::Duration;
    use tracing::debug;

    const SLICE: Duration = Duration::from_millis(100);

    pub(super) fn block_on_pumping<F>(runtime: &Runtime, future: F) -> Result<F::Output, JoinError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let task = runtime.spawn(future);

        debug!("pumping the main run loop");
        // Sliced so a finish that lands before the loop starts is still seen.
        while !task.is_finished() {
            let result = CFRunLoop::run_in_mode(unsafe { kCFRunLoopDefaultMode }, SLICE, false);
            if result == kCFRunLoopRunFinished {
                // No sources yet; the loop returns at once.
                thread::sleep(Duration::from_millis(10));
            }
        }
        runtime.block_on(task)
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
mod imp {
    use super::*;

    pub(super) fn block_on_pumping<F>(runtime: &Runtime, future: F) -> Result<F::Output, JoinError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let task = runtime.spawn(future);
        runtime.block_on(task)
    }
}
