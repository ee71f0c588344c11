//! Command-line interface
//!
//! Subcommand definitions and their execution. Resource commands are
//! generic over the transport so they run against a recording transport in
//! tests; `config` commands only touch the local configuration file.

pub mod output;

use crate::client::Client;
use crate::config::{Config, Overrides};
use crate::error::{Error, Result};
use crate::resource::queue::MessageListOptions;
use crate::resource::{
    HandleDeleteReport, ListOptions, Metadata, Provision, RemoteResource, Subscription, Topic,
};
use crate::transport::{HttpTransport, Transport};
use anyhow::Context;
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};

pub use output::{Output, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Queue operations added by the pub/sub extension
    #[command(subcommand)]
    Queue(QueueCommand),
    /// Topic operations
    #[command(subcommand)]
    Topic(TopicCommand),
    /// Subscription operations
    #[command(subcommand)]
    Subscription(SubscriptionCommand),
    /// Show or change the saved configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Paging flags shared by the list commands
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Name or id of the last item of the previous page
    #[arg(long)]
    pub marker: Option<String>,
    /// Page size
    #[arg(long)]
    pub limit: Option<u64>,
    /// Include metadata, href and timestamps
    #[arg(long)]
    pub detailed: bool,
}

impl ListArgs {
    fn options(&self) -> ListOptions {
        ListOptions {
            marker: self.marker.clone(),
            limit: self.limit,
            detailed: self.detailed,
        }
    }

    fn columns(&self) -> &'static [&'static str] {
        if self.detailed {
            &["name", "metadata", "href", "created_at", "updated_at"]
        } else {
            &["name"]
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// List available queues
    List(ListArgs),
    /// Delete every message in a queue
    Purge { name: String },
    /// Show queue statistics next to its metadata
    Monitor { name: String },
    /// Show queue metadata, or replace existing values with --set
    Metadata {
        name: String,
        /// JSON object with the new values
        #[arg(long, value_name = "JSON")]
        set: Option<String>,
    },
    /// List messages in a queue
    Messages {
        name: String,
        #[arg(long)]
        marker: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
        /// Include messages posted by this client
        #[arg(long)]
        echo: bool,
        /// Include claimed messages
        #[arg(long)]
        include_claimed: bool,
    },
    /// Delete messages by claim handle
    DeleteMessages {
        name: String,
        #[arg(required = true)]
        handles: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TopicCommand {
    /// Create a topic (upsert)
    Create {
        name: String,
        /// Initial metadata as a JSON object
        #[arg(long, value_name = "JSON")]
        metadata: Option<String>,
    },
    /// Delete a topic
    Delete { name: String },
    /// Show topic details
    Show { name: String },
    /// List available topics
    List(ListArgs),
    /// Show topic metadata, or replace existing values with --set
    Metadata {
        name: String,
        /// JSON object with the new values
        #[arg(long, value_name = "JSON")]
        set: Option<String>,
    },
    /// Show topic statistics next to its metadata
    Monitor { name: String },
    /// Publish messages to every subscriber of a topic
    Publish {
        name: String,
        /// A message object or an array of them, e.g. '{"body": "hi", "ttl": 60}'
        #[arg(value_name = "JSON")]
        messages: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SubscriptionCommand {
    /// Subscribe a target to a topic
    Create {
        topic: String,
        /// Delivery target, e.g. http://example.com/hook
        subscriber: String,
        #[arg(long)]
        ttl: Option<i64>,
        /// Subscriber options as a JSON object
        #[arg(long, value_name = "JSON")]
        options: Option<String>,
    },
    /// Show a subscription
    Show { topic: String, id: String },
    /// List the subscriptions of a topic
    List {
        topic: String,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Change subscriber, TTL or options
    Update {
        topic: String,
        id: String,
        #[arg(long)]
        subscriber: Option<String>,
        #[arg(long)]
        ttl: Option<i64>,
        #[arg(long, value_name = "JSON")]
        options: Option<String>,
    },
    /// Delete a subscription
    Delete { topic: String, id: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the saved configuration and the effective endpoint
    Show,
    /// Save values to the configuration file
    Set {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        project_id: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

/// Run a command, connecting over HTTP when it needs the service
pub async fn run(
    command: Command,
    config: &mut Config,
    overrides: &Overrides,
) -> anyhow::Result<Output> {
    let command = match command {
        Command::Config(command) => return configure(command, config, overrides),
        other => other,
    };

    let settings = config
        .connection(overrides)
        .context("Invalid connection settings")?;
    tracing::info!("Using endpoint: {}", settings.endpoint);
    let client = Client::<HttpTransport>::connect(&settings)?;
    Ok(execute(&client, command).await?)
}

/// Execute a resource command against `client`
pub async fn execute<T: Transport>(client: &Client<T>, command: Command) -> Result<Output> {
    match command {
        Command::Queue(command) => queue(client, command).await,
        Command::Topic(command) => topic(client, command).await,
        Command::Subscription(command) => subscription(client, command).await,
        Command::Config(_) => Ok(Output::Nothing),
    }
}

async fn queue<T: Transport>(client: &Client<T>, command: QueueCommand) -> Result<Output> {
    match command {
        QueueCommand::List(args) => {
            let queues = client.queues(&args.options()).collect_all().await?;
            let rows = queues
                .iter()
                .map(|q| {
                    named_row(
                        q.name(),
                        q.cached_metadata(),
                        q.href(),
                        q.created_at(),
                        q.updated_at(),
                    )
                })
                .collect();
            Ok(Output::list(args.columns(), rows))
        },
        QueueCommand::Purge { name } => {
            client.queue(&name, Provision::Local).await?.purge().await?;
            Ok(Output::Message(format!("Queue '{name}' purged")))
        },
        QueueCommand::Monitor { name } => {
            let mut queue = client.queue(&name, Provision::Local).await?;
            Ok(Output::Record(queue.monitor().await?))
        },
        QueueCommand::Metadata { name, set } => {
            let mut queue = client.queue(&name, Provision::Local).await?;
            let metadata = match set {
                Some(raw) => queue.update_metadata(&parse_object(&raw)?).await?.clone(),
                None => queue.metadata().await?.clone(),
            };
            Ok(Output::Record(metadata))
        },
        QueueCommand::Messages {
            name,
            marker,
            limit,
            echo,
            include_claimed,
        } => {
            let queue = client.queue(&name, Provision::Local).await?;
            let options = MessageListOptions {
                marker,
                limit,
                echo,
                include_claimed,
            };
            let messages = queue.messages(&options)?.collect_all().await?;
            let rows = messages
                .iter()
                .map(|m| {
                    object(json!({
                        "id": m.id,
                        "body": m.body,
                        "ttl": m.ttl,
                        "age": m.age,
                        "status": m.status,
                        "handle": m.handle,
                        "consume_count": m.consume_count,
                        "created_at": m.created_at(),
                        "status_end": m.status_end_time(),
                        "first_consumed_at": m.first_consumed_at(),
                        "next_consume_at": m.next_consume_at(),
                    }))
                })
                .collect();
            Ok(Output::list(
                &[
                    "id",
                    "body",
                    "ttl",
                    "age",
                    "status",
                    "handle",
                    "consume_count",
                    "created_at",
                    "status_end",
                    "first_consumed_at",
                    "next_consume_at",
                ],
                rows,
            ))
        },
        QueueCommand::DeleteMessages { name, handles } => {
            let queue = client.queue(&name, Provision::Local).await?;
            let report = queue.delete_by_handles(&handles).await?;
            Ok(report_output(&report))
        },
    }
}

async fn topic<T: Transport>(client: &Client<T>, command: TopicCommand) -> Result<Output> {
    match command {
        TopicCommand::Create { name, metadata } => {
            let mut topic = Topic::new(client.clone(), &name)?;
            if let Some(raw) = metadata {
                topic = topic.with_metadata(parse_object(&raw)?);
            }
            topic.provision(Provision::ForceCreate).await?;
            Ok(Output::Record(object(json!({ "name": topic.name() }))))
        },
        TopicCommand::Delete { name } => {
            let mut topic = client.topic(&name, Provision::Local).await?;
            topic.delete().await?;
            Ok(Output::Message(format!("Topic '{name}' deleted")))
        },
        TopicCommand::Show { name } => {
            let mut topic = client.topic(&name, Provision::Local).await?;
            topic.fetch().await?;
            Ok(Output::Record(named_row(
                topic.name(),
                topic.cached_metadata(),
                topic.href(),
                topic.created_at(),
                topic.updated_at(),
            )))
        },
        TopicCommand::List(args) => {
            let topics = client.topics(&args.options()).collect_all().await?;
            let rows = topics
                .iter()
                .map(|t| {
                    named_row(
                        t.name(),
                        t.cached_metadata(),
                        t.href(),
                        t.created_at(),
                        t.updated_at(),
                    )
                })
                .collect();
            Ok(Output::list(args.columns(), rows))
        },
        TopicCommand::Metadata { name, set } => {
            let mut topic = client.topic(&name, Provision::Local).await?;
            let metadata = match set {
                Some(raw) => topic.update_metadata(&parse_object(&raw)?).await?.clone(),
                None => topic.metadata().await?.clone(),
            };
            Ok(Output::Record(metadata))
        },
        TopicCommand::Monitor { name } => {
            let mut topic = client.topic(&name, Provision::Local).await?;
            Ok(Output::Record(topic.monitor().await?))
        },
        TopicCommand::Publish { name, messages } => {
            let messages = match parse_json(&messages)? {
                Value::Array(messages) => messages,
                single => vec![single],
            };
            let count = messages.len();
            let topic = client.topic(&name, Provision::Local).await?;
            topic.publish(messages).await?;
            Ok(Output::Message(format!(
                "Published {count} message(s) to topic '{name}'"
            )))
        },
    }
}

async fn subscription<T: Transport>(
    client: &Client<T>,
    command: SubscriptionCommand,
) -> Result<Output> {
    match command {
        SubscriptionCommand::Create {
            topic,
            subscriber,
            ttl,
            options,
        } => {
            let options = options
                .as_deref()
                .map(parse_object)
                .transpose()?
                .unwrap_or_default();
            let mut subscription = Subscription::new(client.clone(), &topic)?
                .with_subscriber(&subscriber)
                .with_options(options);
            if let Some(ttl) = ttl {
                subscription = subscription.with_ttl(ttl);
            }
            subscription.provision(Provision::ForceCreate).await?;
            Ok(Output::Record(subscription_row(&subscription)))
        },
        SubscriptionCommand::Show { topic, id } => {
            let subscription = client.subscription(&topic, &id).await?;
            Ok(Output::Record(subscription_row(&subscription)))
        },
        SubscriptionCommand::List { topic, list } => {
            let subscriptions = client
                .subscriptions(&topic, &list.options())
                .collect_all()
                .await?;
            let rows = subscriptions.iter().map(subscription_row).collect();
            Ok(Output::list(
                &["id", "subscriber", "ttl", "options", "confirmed"],
                rows,
            ))
        },
        SubscriptionCommand::Update {
            topic,
            id,
            subscriber,
            ttl,
            options,
        } => {
            let mut changes = Metadata::new();
            if let Some(subscriber) = subscriber {
                changes.insert("subscriber".to_string(), Value::String(subscriber));
            }
            if let Some(ttl) = ttl {
                changes.insert("ttl".to_string(), Value::from(ttl));
            }
            if let Some(raw) = options {
                changes.insert("options".to_string(), Value::Object(parse_object(&raw)?));
            }
            if changes.is_empty() {
                return Err(Error::MissingParameter(
                    "subscriber, ttl or options".to_string(),
                ));
            }

            let mut subscription = Subscription::new(client.clone(), &topic)?.with_id(&id);
            subscription.update(changes).await?;
            Ok(Output::Record(subscription_row(&subscription)))
        },
        SubscriptionCommand::Delete { topic, id } => {
            let mut subscription = Subscription::new(client.clone(), &topic)?.with_id(&id);
            subscription.delete().await?;
            Ok(Output::Message(format!("Subscription '{id}' deleted")))
        },
    }
}

fn configure(
    command: ConfigCommand,
    config: &mut Config,
    overrides: &Overrides,
) -> anyhow::Result<Output> {
    match command {
        ConfigCommand::Show => {
            let mut record = object(serde_json::to_value(&*config)?);
            record.insert(
                "effective_endpoint".to_string(),
                Value::String(config.effective_endpoint(overrides.endpoint.as_deref())),
            );
            if let Some(path) = Config::config_path() {
                record.insert(
                    "path".to_string(),
                    Value::String(path.display().to_string()),
                );
            }
            Ok(Output::Record(record))
        },
        ConfigCommand::Set {
            endpoint,
            project_id,
            client_id,
            timeout_secs,
        } => {
            if let Some(endpoint) = endpoint {
                crate::transport::http::api_root(&endpoint)
                    .with_context(|| format!("Invalid endpoint '{endpoint}'"))?;
                config.endpoint = Some(endpoint);
            }
            if project_id.is_some() {
                config.project_id = project_id;
            }
            if client_id.is_some() {
                config.client_id = client_id;
            }
            if config.client_id.is_none() {
                config.client_id = Some(config.effective_client_id());
            }
            if timeout_secs.is_some() {
                config.timeout_secs = timeout_secs;
            }
            config.save().context("Failed to save configuration")?;
            Ok(Output::Message("Configuration saved".to_string()))
        },
    }
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(Error::InvalidJson)
}

fn parse_object(raw: &str) -> Result<Metadata> {
    match parse_json(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidJson(serde::de::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn named_row(
    name: &str,
    metadata: Option<&Metadata>,
    href: Option<&str>,
    created_at: String,
    updated_at: String,
) -> Map<String, Value> {
    object(json!({
        "name": name,
        "metadata": metadata,
        "href": href,
        "created_at": created_at,
        "updated_at": updated_at,
    }))
}

fn subscription_row<T: Transport>(subscription: &Subscription<T>) -> Map<String, Value> {
    object(json!({
        "id": subscription.id(),
        "topic": subscription.topic_name(),
        "subscriber": subscription.subscriber(),
        "ttl": subscription.ttl(),
        "options": subscription.options(),
        "confirmed": subscription.confirmed(),
    }))
}

fn report_output(report: &HandleDeleteReport) -> Output {
    Output::Record(object(json!({
        "successful": report.successful,
        "expired": report.expired,
        "invalid": report.invalid,
    })))
}
