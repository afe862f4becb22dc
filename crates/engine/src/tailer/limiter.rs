//! 파일당 라인 전달 속도 제한기
//!
//! 1초 구간을 100ms 슬롯으로 나눈 슬라이딩 윈도우 방식입니다.
//! 최근 11개 슬롯(현재 슬롯 포함)의 허가 수 합이 한도 미만일 때만 허가하므로,
//! 임의의 1초 구간에서 허가되는 라인 수는 한도를 넘지 않습니다.

use std::time::{Duration, Instant};

/// 슬롯 폭
const SLOT: Duration = Duration::from_millis(100);

/// 현재 슬롯 이전에 합산하는 슬롯 수 (1초 / 100ms)
const LOOKBACK_SLOTS: u64 = 10;

/// 링 크기 (현재 슬롯 + LOOKBACK_SLOTS)
const RING_SIZE: usize = LOOKBACK_SLOTS as usize + 1;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    index: u64,
    count: u32,
}

/// 슬라이딩 윈도우 속도 제한기
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    origin: Instant,
    ring: [Slot; RING_SIZE],
}

impl RateLimiter {
    /// 초당 `limit`개를 허가하는 제한기를 생성합니다.
    ///
    /// `limit`이 0이면 1로 취급합니다.
    pub fn new(limit: u32) -> Self {
        Self::with_origin(limit, Instant::now())
    }

    fn with_origin(limit: u32, origin: Instant) -> Self {
        Self {
            limit: limit.max(1),
            origin,
            ring: [Slot::default(); RING_SIZE],
        }
    }

    /// 초당 허가 한도
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 현재 시각 기준으로 허가를 시도합니다. 대기하지 않습니다.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// 주어진 시각 기준으로 허가를 시도합니다.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        let current = slot_index(now.saturating_duration_since(self.origin));
        let oldest = current.saturating_sub(LOOKBACK_SLOTS);

        let used: u64 = self
            .ring
            .iter()
            .filter(|slot| slot.index >= oldest && slot.index <= current)
            .map(|slot| u64::from(slot.count))
            .sum();
        if used >= u64::from(self.limit) {
            return false;
        }

        let slot = &mut self.ring[(current % RING_SIZE as u64) as usize];
        if slot.index != current {
            *slot = Slot {
                index: current,
                count: 0,
            };
        }
        slot.count += 1;
        true
    }
}

fn slot_index(elapsed: Duration) -> u64 {
    (elapsed.as_millis() / SLOT.as_millis()) as u64
}
