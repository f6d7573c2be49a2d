//! Provider configuration: built-in aliases, viewer registrations and the default
//! command for each cloud, plus the composition of the command subsystem.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::alias::AliasStore;
use crate::error::LensResult;
use crate::session::{Cloud, Session};
use crate::source::{DataSources, Target};
use crate::view::{
    browser_factory, AliasView, AppRequest, Component, EnterContext, EnterFn, MenuHint, NavigationStack, Router,
    ViewContext, ViewFactory, ViewerRegistry, ALIAS_VIEW,
};
use crate::Config;

pub const EC2: &str = "ec2";
pub const S3: &str = "s3";
pub const STORAGE: &str = "storage";
/// Objects of one S3 bucket, reached by entering a bucket row
pub const OBJ: &str = "OBJ";
/// Objects of one GCS bucket, reached by entering a bucket row
pub const STORAGE_OBJ: &str = "STORAGE_OBJ";

struct Service {
    mnemonics: &'static [&'static str],
    resource: &'static str,
    description: &'static str,
    /// `None` for views that work with any cloud
    cloud: Option<Cloud>,
}

const SERVICES: &[Service] = &[
    Service {
        mnemonics: &["ec2", "Ec2"],
        resource: EC2,
        description: "EC2 Instances",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["s3", "S3"],
        resource: S3,
        description: "S3 Buckets",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["ebs", "EBS"],
        resource: "ebs",
        description: "EBS Volumes",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["sg", "SG"],
        resource: "sg",
        description: "Security Groups",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["iam:u", "IAM:U"],
        resource: "iam:u",
        description: "IAM Users",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["iam:g", "IAM:g"],
        resource: "iam:g",
        description: "IAM Groups",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["iam:r", "IAM:R"],
        resource: "iam:r",
        description: "IAM Roles",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["ec2:s", "Ec2:S"],
        resource: "ec2:s",
        description: "EC2 Snapshots",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["ec2:i", "Ec2:I"],
        resource: "ec2:i",
        description: "EC2 Images",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["sqs", "SQS"],
        resource: "sqs",
        description: "SQS Queues",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["vpc", "VPC"],
        resource: "vpc",
        description: "VPCs",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["subnet", "SUBNET"],
        resource: "subnet",
        description: "Subnets",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["lambda", "LAMBDA"],
        resource: "lambda",
        description: "Lambda Functions",
        cloud: Some(Cloud::Aws),
    },
    Service {
        mnemonics: &["storage", "STORAGE"],
        resource: STORAGE,
        description: "Cloud Storage Buckets",
        cloud: Some(Cloud::Gcp),
    },
    Service {
        mnemonics: &["aliases", "alias", "a"],
        resource: ALIAS_VIEW,
        description: "Aliases",
        cloud: None,
    },
];

/// Command run at startup and when switching clouds
pub fn default_command(cloud: Cloud) -> &'static str {
    match cloud {
        Cloud::Aws => EC2,
        Cloud::Gcp => STORAGE,
    }
}

/// Register every built-in alias with the store
pub fn register_builtins(store: &AliasStore) -> LensResult<()> {
    for service in SERVICES {
        for mnemonic in service.mnemonics {
            store.register_alias(mnemonic, service.resource)?;
        }
    }
    Ok(())
}

/// Help entries for the services available on `cloud`
pub fn services_for(cloud: Cloud) -> Vec<MenuHint> {
    SERVICES
        .iter()
        .filter(|s| s.cloud.is_none() || s.cloud == Some(cloud))
        .map(|s| MenuHint::new(s.mnemonics[0], s.description))
        .collect()
}

/// Enter handler that opens `resource` with the selected row's first cell as path
fn drill_into(resource: &'static str) -> EnterFn {
    Arc::new(move |ctx: &EnterContext<'_>| {
        ctx.row.first().map(|name| AppRequest::Open {
            resource: resource.to_string(),
            path: name.clone(),
        })
    })
}

/// The viewer registrations for every supported resource
pub fn viewer_registry(sources: DataSources, aliases: Arc<AliasStore>) -> ViewerRegistry {
    let alias_view: ViewFactory = Arc::new(move |_: &Target<'_>| {
        Some(Box::new(AliasView::new(Arc::clone(&aliases))) as Box<dyn Component>)
    });

    ViewerRegistry::builder(browser_factory(sources))
        .register(S3, None, Some(drill_into(OBJ)))
        .register(STORAGE, None, Some(drill_into(STORAGE_OBJ)))
        .register(ALIAS_VIEW, Some(alias_view), None)
        .build()
}

/// Drop user aliases and reload the built-ins without composing a router.
///
/// The user file is truncated before it is read, so a corrupt file is recoverable.
pub fn reset_aliases(config: &Config) -> LensResult<Arc<AliasStore>> {
    let aliases = Arc::new(AliasStore::new(config.aliases_file()));
    register_builtins(&aliases)?;
    aliases.clear_user()?;
    let count = aliases.ensure()?;
    tracing::info!("Alias table reset to {} built-ins", count);
    Ok(aliases)
}

/// Wire the alias store, registry, stack and router together.
///
/// Must run inside a tokio runtime: the root view starts refreshing right away.
pub fn compose(
    config: &Config,
    session: Session,
    sources: DataSources,
    shutdown: CancellationToken,
) -> LensResult<Router> {
    let aliases = Arc::new(AliasStore::new(config.aliases_file()));
    register_builtins(&aliases)?;

    let ctx = ViewContext::new(session, config, shutdown);
    let registry = Arc::new(viewer_registry(sources, Arc::clone(&aliases)));
    let root = Box::new(AliasView::new(Arc::clone(&aliases)));
    let stack = Arc::new(NavigationStack::new(root, &ctx)?);
    let services = services_for(ctx.session.cloud);

    let router = Router::new(aliases, registry, stack, ctx, services);
    let count = router.init()?;
    tracing::info!("Command subsystem ready with {} aliases", count);
    Ok(router)
}
