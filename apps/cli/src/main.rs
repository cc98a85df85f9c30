use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{ContactsClient, FavoriteToggle, SubmissionChannel};
use shared::domain::ContactId;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: String,
    /// Filter the listing by a name substring.
    #[arg(long)]
    q: Option<String>,
    /// Create a blank contact before listing.
    #[arg(long)]
    create: bool,
    /// Toggle the favorite flag of the given contact id.
    #[arg(long)]
    toggle: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let client = Arc::new(ContactsClient::new(&args.server_url)?);

    if args.create {
        let id = client.create_contact().await?;
        println!("Created contact {id}");
    }

    if let Some(raw_id) = args.toggle {
        let id = ContactId(raw_id);
        let contact = client.get_contact(&id).await?;
        let name = contact.display_name().unwrap_or_else(|| "No Name".into());
        println!("Toggling favorite for {name}");

        let control = FavoriteToggle::for_contact(&contact);
        let channel = SubmissionChannel::new(client.clone());

        let idle = channel.state().await;
        println!("{} {}", control.glyph(&idle), control.label(&idle));

        let settle = control.activate(&channel).await;
        let pending = channel.state().await;
        println!("{} {} (pending)", control.glyph(&pending), control.label(&pending));

        settle.await?;
        let refreshed = client.get_contact(&id).await?;
        println!("persisted favorite = {}", refreshed.favorite);
    }

    for contact in client.list_contacts(args.q.as_deref()).await? {
        let marker = if contact.favorite { '★' } else { '☆' };
        let name = match (contact.first.as_deref(), contact.last.as_deref()) {
            (None, None) => "No Name".to_string(),
            (first, last) => [first, last]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" "),
        };
        println!("{marker} {name} ({})", contact.id);
    }

    Ok(())
}
