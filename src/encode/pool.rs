use std::cell::RefCell;

// Buffers above this size are dropped instead of being kept for reuse.
const MAX_POOLED_CAPACITY: usize = 1 << 20;

#[derive(Default)]
struct BufferPool {
    buffer: Vec<u8>,
}

impl BufferPool {
    fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    fn put(&mut self, mut buffer: Vec<u8>) {
        if buffer.capacity() > MAX_POOLED_CAPACITY {
            return;
        }
        buffer.clear();
        if buffer.capacity() > self.buffer.capacity() {
            self.buffer = buffer;
        }
    }
}

thread_local! {
    static OUTPUT_POOL: RefCell<BufferPool> = RefCell::new(BufferPool::default());
}

pub(crate) fn take_buffer() -> Vec<u8> {
    OUTPUT_POOL.with(|pool| pool.borrow_mut().take())
}

pub(crate) fn put_buffer(buffer: Vec<u8>) {
    OUTPUT_POOL.with(|pool| pool.borrow_mut().put(buffer));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn returned_buffers_are_reused_empty() {
        let mut buffer = take_buffer();
        buffer.extend_from_slice(b"payload");
        let capacity = buffer.capacity();
        put_buffer(buffer);

        let reused = take_buffer();
        assert!(reused.is_empty());
        assert!(reused.capacity() >= capacity);
    }

    #[rstest::rstest]
    fn oversized_buffers_are_dropped() {
        let _ = take_buffer();
        put_buffer(Vec::with_capacity(MAX_POOLED_CAPACITY + 1));
        assert_eq!(take_buffer().capacity(), 0);
    }
}
