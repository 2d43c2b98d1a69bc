//! Payload assembly and region partitioning

use crate::cart::RegionSink;
use crate::config::RegionSpec;
use crate::error::{Error, Result};
use serde::Serialize;
use std::ops::Range;

/// A slice of the payload assigned to one named region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub name: String,
    pub tag: u8,
    /// Address the region is mapped at
    pub base: usize,
    /// Byte range within the payload
    pub range: Range<usize>,
}

impl Region {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Finished payload: event records followed by packed frames
#[derive(Debug, Clone)]
pub struct Layout {
    pub data: Vec<u8>,
    /// Length of the event record stream at the start of `data`
    pub events_len: usize,
    pub regions: Vec<Region>,
}

impl Layout {
    /// Concatenate events and frames, check the budget and split the result
    /// across `specs` in order. The first region is always emitted; later
    /// ones only while bytes remain.
    pub fn assemble(
        events: &[u8],
        frames: &[u8],
        budget: usize,
        specs: &[RegionSpec],
    ) -> Result<Self> {
        let total = events.len() + frames.len();
        let capacity: usize = specs.iter().map(|s| s.capacity).sum();
        let limit = budget.min(capacity);
        if total > limit {
            return Err(Error::CapacityExceeded {
                actual: total,
                budget: limit,
            });
        }

        let mut data = Vec::with_capacity(total);
        data.extend_from_slice(events);
        data.extend_from_slice(frames);

        let mut regions = Vec::new();
        let mut offset = 0;
        for (i, spec) in specs.iter().enumerate() {
            if i > 0 && offset >= total {
                break;
            }
            let end = (offset + spec.capacity).min(total);
            regions.push(Region {
                name: spec.name.clone(),
                tag: spec.tag,
                base: spec.base,
                range: offset..end,
            });
            offset = end;
        }

        Ok(Self {
            data,
            events_len: events.len(),
            regions,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length of the packed frame data
    pub fn frames_len(&self) -> usize {
        self.data.len() - self.events_len
    }

    pub fn region_bytes(&self, region: &Region) -> &[u8] {
        &self.data[region.range.clone()]
    }

    /// Hand every region to a writer
    pub fn write_to<S: RegionSink>(&self, sink: &mut S) -> Result<()> {
        for region in &self.regions {
            sink.add_region(region.tag, 0, self.region_bytes(region))?;
        }
        Ok(())
    }
}
