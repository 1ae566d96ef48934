use anyhow::{anyhow, Context};
use threadlet_api::{
    CommentApi, CommentId, CommentUpdate, NewComment, Order, OrderBy, TargetId, TargetType, Uuid,
};
use threadlet_client::{CommentSection, SectionConfig};

mod http;
use http::HttpApi;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base url of the comment service
    #[structopt(short, long, env = "THREADLET_HOST")]
    host: String,

    /// Bearer token of the acting user
    #[structopt(short, long, env = "THREADLET_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[structopt(long, env = "THREADLET_PAGE_SIZE", default_value = "8")]
    page_size: u32,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
struct Target {
    /// Kind of commented entity: post or page
    #[structopt(long = "on", default_value = "post", parse(try_from_str = parse_target_type))]
    target_type: TargetType,

    /// Id of the commented entity
    target_id: Uuid,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print the comment thread of an entity
    List {
        #[structopt(flatten)]
        target: Target,

        /// Number of reply levels to expand below the top-level comments
        #[structopt(short, long, default_value = "0")]
        depth: u32,

        /// createdAt, likeCount or replyCount
        #[structopt(long, default_value = "createdAt", parse(try_from_str = parse_order_by))]
        order_by: OrderBy,

        /// Oldest or smallest first
        #[structopt(long)]
        asc: bool,

        /// Fetch every page of every printed level instead of only the first
        #[structopt(long)]
        all: bool,
    },

    /// Post a top-level comment
    Post {
        #[structopt(flatten)]
        target: Target,

        content: String,

        #[structopt(long)]
        private: bool,
    },

    /// Reply to a comment
    Reply {
        #[structopt(flatten)]
        target: Target,

        parent: Uuid,

        content: String,

        #[structopt(long)]
        private: bool,
    },

    /// Replace the content of a comment
    Edit {
        id: Uuid,

        content: String,

        #[structopt(long)]
        private: bool,
    },

    /// Delete a comment
    Delete { id: Uuid },

    /// Like a comment, or unlike it if already liked
    Like { id: Uuid },
}

fn parse_target_type(s: &str) -> anyhow::Result<TargetType> {
    match s {
        "post" => Ok(TargetType::Post),
        "page" => Ok(TargetType::Page),
        _ => Err(anyhow!("unknown target type {s:?}")),
    }
}

fn parse_order_by(s: &str) -> anyhow::Result<OrderBy> {
    match s {
        "createdAt" => Ok(OrderBy::CreatedAt),
        "likeCount" => Ok(OrderBy::LikeCount),
        "replyCount" => Ok(OrderBy::ReplyCount),
        _ => Err(anyhow!("unknown order {s:?}")),
    }
}

fn print_level(section: &CommentSection, parent: Option<CommentId>, indent: usize) {
    let level = match parent {
        None => section.roots().collect::<Vec<_>>(),
        Some(p) => section.replies(&p).collect::<Vec<_>>(),
    };
    for c in level {
        println!(
            "{:indent$}{} {} ({}){}: {} [{} likes, {} replies]",
            "",
            c.id.0,
            c.author.name,
            c.created_at.format("%Y-%m-%d %H:%M"),
            if c.is_private { " [private]" } else { "" },
            c.content,
            c.like_count,
            c.reply_count,
            indent = indent * 2,
        );
        print_level(section, Some(c.id), indent + 1);
    }
}

async fn load_level(
    section: &mut CommentSection,
    api: &mut HttpApi,
    parent: Option<CommentId>,
    all: bool,
) -> anyhow::Result<()> {
    section
        .load_more(api, parent)
        .await
        .with_context(|| format!("loading comments under {parent:?}"))?;
    while all && section.can_load_more(parent) {
        section
            .load_more(api, parent)
            .await
            .with_context(|| format!("loading more comments under {parent:?}"))?;
    }
    Ok(())
}

async fn list(
    api: &mut HttpApi,
    mut cfg: SectionConfig,
    order: Order,
    depth: u32,
    all: bool,
) -> anyhow::Result<()> {
    cfg.default_order = order;
    let mut section = CommentSection::new(cfg, None);
    load_level(&mut section, api, None, all).await?;

    let mut level = section.roots().map(|c| c.id).collect::<Vec<_>>();
    for _ in 0..depth {
        let mut next = Vec::new();
        for id in level {
            let has_replies = section
                .get(&id)
                .map(|c| c.reply_count > 0)
                .unwrap_or(false);
            if !has_replies {
                continue;
            }
            load_level(&mut section, api, Some(id), all).await?;
            next.extend(section.replies(&id).map(|c| c.id));
        }
        level = next;
    }

    print_level(&section, None, 0);
    if section.can_load_more(None) {
        println!("(more comments available, use --all to fetch them)");
    }
    Ok(())
}

async fn create(
    api: &mut HttpApi,
    target: Target,
    parent: Option<Uuid>,
    content: String,
    private: bool,
) -> anyhow::Result<()> {
    let new = NewComment {
        target_type: target.target_type,
        target_id: TargetId(target.target_id),
        content,
        reply_id: parent.map(CommentId),
        is_private: private,
        show_client_info: false,
    };
    new.validate().context("validating comment")?;
    let c = api
        .create_comment(&new)
        .await
        .context("creating comment")?;
    tracing::info!(id = ?c.id, depth = c.depth, "created comment");
    println!("{}", c.id.0);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    if opt.page_size == 0 {
        return Err(anyhow!("page size must be at least 1"));
    }
    let mut api = HttpApi::new(opt.host, opt.token);

    match opt.cmd {
        Command::List {
            target,
            depth,
            order_by,
            asc,
            all,
        } => {
            let mut cfg = SectionConfig::new(target.target_type, TargetId(target.target_id));
            cfg.page_size = opt.page_size;
            let order = Order {
                by: order_by,
                desc: !asc,
            };
            list(&mut api, cfg, order, depth, all).await?;
        }
        Command::Post {
            target,
            content,
            private,
        } => create(&mut api, target, None, content, private).await?,
        Command::Reply {
            target,
            parent,
            content,
            private,
        } => create(&mut api, target, Some(parent), content, private).await?,
        Command::Edit {
            id,
            content,
            private,
        } => {
            let update = CommentUpdate {
                content,
                is_private: private,
                show_client_info: false,
            };
            update.validate().context("validating comment")?;
            let c = api
                .update_comment(CommentId(id), &update)
                .await
                .context("editing comment")?;
            tracing::info!(id = ?c.id, "edited comment");
        }
        Command::Delete { id } => {
            api.delete_comment(CommentId(id))
                .await
                .context("deleting comment")?;
            tracing::info!(?id, "deleted comment");
        }
        Command::Like { id } => {
            let status = api
                .toggle_like(TargetType::Comment, id)
                .await
                .context("toggling like")?;
            println!("{}", if status.status { "liked" } else { "unliked" });
        }
    }

    Ok(())
}
