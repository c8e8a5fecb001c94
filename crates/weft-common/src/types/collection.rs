use core::fmt;

use serde::Serialize;

use crate::types::{
    aturi::UriPath,
    nsid::Nsid,
    recordkey::{RecordKey, RecordKeyType},
};

/// Trait for a collection of records that can be stored in a repository.
///
/// The records all have the same Lexicon schema.
///
/// Implemented on the record type itself.
pub trait Collection: fmt::Debug + Serialize {
    /// The NSID for the Lexicon that defines the schema of records in this collection.
    const NSID: &'static str;

    /// Returns the [`Nsid`] for the Lexicon that defines the schema of records in this
    /// collection.
    ///
    /// # Panics
    ///
    /// Panics if [`Self::NSID`] is not a valid NSID.
    fn nsid() -> Nsid<'static> {
        match Nsid::new_static(Self::NSID) {
            Ok(nsid) => nsid,
            Err(e) => panic!("collection NSID is invalid: {e}"),
        }
    }

    /// Returns the repo path `<collection>/<record-key>` for a record in this collection.
    fn repo_path<'u, T: RecordKeyType>(rkey: &'u RecordKey<T>) -> UriPath<'u> {
        UriPath {
            collection: Self::nsid(),
            rkey: Some(rkey.as_rkey()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::aturi::AtUri;
    use crate::types::ident::AtIdentifier;
    use crate::types::recordkey::{LiteralKey, SelfRecord};
    use crate::types::tid::Tid;

    #[derive(Debug, Serialize)]
    struct Profile {
        display_name: String,
    }

    impl Collection for Profile {
        const NSID: &'static str = "app.bsky.actor.profile";
    }

    #[derive(Debug, Serialize)]
    struct Post;

    impl Collection for Post {
        const NSID: &'static str = "app.bsky.feed.post";
    }

    #[test]
    fn repo_paths() {
        let rkey = RecordKey(LiteralKey::<SelfRecord>::literal());
        let path = Profile::repo_path(&rkey);
        assert_eq!(path.to_string(), "app.bsky.actor.profile/self");

        let tid = RecordKey(Tid::raw("3jzfcijpj2z2a"));
        let uri = AtUri::from_parts(
            AtIdentifier::raw("did:plc:7iza6de2dwap2sbkpav7c6c6"),
            Some(Post::repo_path(&tid)),
        );
        assert_eq!(
            uri.as_str(),
            "at://did:plc:7iza6de2dwap2sbkpav7c6c6/app.bsky.feed.post/3jzfcijpj2z2a"
        );
        assert_eq!(Post::nsid().name(), "post");
    }
}
