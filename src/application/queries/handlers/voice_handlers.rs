//! Voice Query Handlers

use crate::application::error::ApplicationError;
use crate::application::queries::ListVoices;
use crate::domain::voice::{Catalog, VoiceDescriptor};

/// ListVoices Handler
pub struct ListVoicesHandler {
    catalog: Catalog,
}

impl ListVoicesHandler {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub async fn handle(
        &self,
        _query: ListVoices,
    ) -> Result<&'static [VoiceDescriptor], ApplicationError> {
        Ok(self.catalog.all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_voices_returns_seed() {
        let handler = ListVoicesHandler::new(Catalog::seeded());
        let voices = handler.handle(ListVoices).await.unwrap();

        assert_eq!(voices.len(), 4);
        assert_eq!(voices[1].id, "en-US-sarah");
    }
}
