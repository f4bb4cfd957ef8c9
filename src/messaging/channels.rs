// Lock-free SPSC channels between the scheduler, audio and UI threads

use crate::audio::click::ClickEvent;
use crate::messaging::notification::Notification;
use crate::scheduler::beat::QueuedBeat;
use ringbuf::{HeapRb, traits::Split};

/// Scheduler (push at tail) → visual sync (pop at head)
pub type BeatProducer = ringbuf::HeapProd<QueuedBeat>;
pub type BeatConsumer = ringbuf::HeapCons<QueuedBeat>;

pub fn create_beat_queue(capacity: usize) -> (BeatProducer, BeatConsumer) {
    let rb = HeapRb::<QueuedBeat>::new(capacity);
    rb.split()
}

/// Click trigger → audio callback
pub type ClickProducer = ringbuf::HeapProd<ClickEvent>;
pub type ClickConsumer = ringbuf::HeapCons<ClickEvent>;

pub fn create_click_channel(capacity: usize) -> (ClickProducer, ClickConsumer) {
    let rb = HeapRb::<ClickEvent>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}
