mod read_operations;
mod serializer;

use crate::collection::{CollectionEventInfo, CollectionEventListener};
use crate::common::WardenEventBus;

pub(crate) use read_operations::*;
pub(crate) use serializer::*;

pub(crate) type CollectionEventBus = WardenEventBus<CollectionEventInfo, CollectionEventListener>;
