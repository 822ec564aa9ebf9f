use core::{cell::UnsafeCell, mem::MaybeUninit, sync::atomic::AtomicU8};

#[repr(u8)]
enum WriteOnceState {
    Uninitialized,
    Initializing,
    Initialized,
}

/// a cell which is written exactly once, early during boot, and is then only
/// ever read.
pub struct WriteOnce<T> {
    value: UnsafeCell<MaybeUninit<T>>,
    state: AtomicU8,
}
impl<T> WriteOnce<T> {
    pub const fn new() -> Self {
        Self {
            value: UnsafeCell::new(MaybeUninit::uninit()),
            state: AtomicU8::new(WriteOnceState::Uninitialized as u8),
        }
    }

    /// write the value. panics if the cell was already written.
    pub fn write(&self, initial_value: T) {
        self.state
            .compare_exchange(
                WriteOnceState::Uninitialized as u8,
                WriteOnceState::Initializing as u8,
                // acquire ordering so that the write to the value is strictly after we see the uninit state.
                core::sync::atomic::Ordering::Acquire,
                core::sync::atomic::Ordering::Relaxed,
            )
            .expect("write once value was written to twice");

        let value = unsafe {
            // SAFETY: moving to the initializing state grants exclusive access. any concurrent
            // reader or writer observing that state panics instead of touching the value.
            &mut *self.value.get()
        };
        value.write(initial_value);

        // no compare exchange needed, the initializing state already guarantees exclusivity.
        self.state.store(
            WriteOnceState::Initialized as u8,
            // release ordering so that the write to the value happens strictly before this store.
            core::sync::atomic::Ordering::Release,
        );
    }

    /// gets a reference to the value, or `None` if it was not written yet.
    pub fn try_get(&self) -> Option<&T> {
        // acquire ordering so that reading the value is strictly after observing the initialized state.
        if self.state.load(core::sync::atomic::Ordering::Acquire)
            != WriteOnceState::Initialized as u8
        {
            return None;
        }
        let value = unsafe {
            // SAFETY: the cell is initialized, and an initialized cell is never written again.
            &*self.value.get()
        };
        Some(unsafe {
            // SAFETY: we verified that the value is initialized
            value.assume_init_ref()
        })
    }

    /// gets a reference to the value. panics if it was not written yet.
    pub fn get(&self) -> &T {
        match self.try_get() {
            Some(value) => value,
            None => panic!("write once value is being read before being fully initialized"),
        }
    }
}
unsafe impl<T: Send> Send for WriteOnce<T> {}
unsafe impl<T: Sync> Sync for WriteOnce<T> {}
impl<T> Drop for WriteOnce<T> {
    fn drop(&mut self) {
        if self.state.load(core::sync::atomic::Ordering::Acquire)
            == WriteOnceState::Initialized as u8
        {
            let value = self.value.get_mut();
            unsafe {
                // SAFETY: the value is initialized and is only dropped here, when the cell itself
                // is dropped.
                value.assume_init_drop()
            };
        }
    }
}
