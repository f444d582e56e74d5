//! End-to-end tests for the tag rewriter.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use image_transformer::{
    parse_module, transform, transform_with_loader, ComponentKind, GlobalConfig,
    NoopModuleLoader, TransformError, TransformOptions, TransformResult, UrlPolicy,
};
use pretty_assertions::assert_eq;

fn options(config: GlobalConfig, url_policy: UrlPolicy) -> TransformOptions {
    TransformOptions {
        filename: Some(Utf8PathBuf::from("page.jsx")),
        config: Arc::new(config),
        url_policy,
    }
}

/// Transforms `source` and checks that the output is still a valid module.
fn transform_checked(source: &str, options: &TransformOptions) -> TransformResult {
    let result = transform_with_loader(source, options, &NoopModuleLoader)
        .unwrap_or_else(|err| panic!("transform failed: {err}"));
    if let Err(err) = parse_module(&result.code, options.filename.as_deref()) {
        panic!("output does not parse: {err}\n{}", result.code);
    }
    result
}

fn run_full(source: &str, config: GlobalConfig, policy: UrlPolicy) -> TransformResult {
    transform_checked(source, &options(config, policy))
}

fn run(source: &str) -> String {
    run_full(source, GlobalConfig::default(), UrlPolicy::default()).code
}

fn run_with_config(source: &str, config: &str) -> String {
    let config = serde_json::from_str(config).unwrap();
    run_full(source, config, UrlPolicy::default()).code
}

fn run_err(source: &str, config: GlobalConfig) -> TransformError {
    transform_with_loader(
        source,
        &options(config, UrlPolicy::default()),
        &NoopModuleLoader,
    )
    .unwrap_err()
}

fn kinds(result: &TransformResult) -> Vec<ComponentKind> {
    result.tags.iter().map(|tag| tag.kind).collect()
}

// ============================================================================
// IMG
// ============================================================================

#[test]
fn img_multiple_sizes() {
    let output = run(
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./a.png')} sizes={[400, 800]} />;\n",
    );
    assert_eq!(
        output,
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./a.png')} sizes={[400, 800]} rawSrc={{ fallback: { 400: { 1: require('./a.png?url&width=400') }, 800: { 1: require('./a.png?url&width=800') } } }} />;\n"
    );
}

#[test]
fn img_convert_to_webp() {
    let output = run(
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./image.jpg')} webp />;",
    );
    insta::assert_snapshot!(
        output.lines().nth(1).unwrap(),
        @"<Img src={require('./image.jpg')} webp rawSrc={{ fallback: { original: { 1: require('./image.jpg?url') } }, webp: { original: { 1: require('./image.jpg?webp') } } }} />;"
    );
}

#[test]
fn img_without_props_is_a_single_locator() {
    let output = run(
        "import { Img } from 'react-optimized-image';\n\
         <Img src={require(\"./image.png\")} />;",
    );
    insta::assert_snapshot!(
        output.lines().nth(1).unwrap(),
        @r#"<Img src={require("./image.png")} rawSrc={{ fallback: { original: { 1: require("./image.png") } } }} />;"#
    );
}

#[test]
fn img_base_query_rewrites_src() {
    let output = run(
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./image.png')} url />;",
    );
    insta::assert_snapshot!(
        output.lines().nth(1).unwrap(),
        @"<Img src={require('./image.png?url')} url rawSrc={{ fallback: { original: { 1: require('./image.png?url') } } }} />;"
    );
}

#[test]
fn img_multiple_query_params() {
    let output = run(
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./image.png?width=1200')} original inline={false} sizes={[400, 800]} />;",
    );
    insta::assert_snapshot!(
        output.lines().nth(1).unwrap(),
        @"<Img src={require('./image.png?width=1200&original')} original inline={false} sizes={[400, 800]} rawSrc={{ fallback: { 400: { 1: require('./image.png?width=400&original&url') }, 800: { 1: require('./image.png?width=800&original&url') } } }} />;"
    );
}

#[test]
fn img_densities_multiply_widths() {
    let result = run_full(
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./a.png')} sizes={[400]} densities={[1, 2]} />;",
        GlobalConfig::default(),
        UrlPolicy::default(),
    );
    assert!(result.code.contains(
        "rawSrc={{ fallback: { 400: { 1: require('./a.png?url&width=400'), 2: require('./a.png?url&width=800') } } }}"
    ));
}

#[test]
fn img_imported_source() {
    let source = "import Img from 'react-optimized-image';\n\
                  import image from './image.png?width=1200';\n\
                  <Img src={image} sizes={[400, 800]} />;";
    let output = run(source);
    insta::assert_snapshot!(
        output.lines().nth(2).unwrap(),
        @"<Img src={image} sizes={[400, 800]} rawSrc={{ fallback: { 400: { 1: require('./image.png?width=400&url') }, 800: { 1: require('./image.png?width=800&url') } } }} />;"
    );
}

#[test]
fn img_url_policies_with_webp_and_sizes() {
    let source = "import Img from 'react-optimized-image';\n\
                  import image from './image.png';\n\
                  <Img src={image} sizes={[400, 800]} webp />;";

    let fallback_only = run_full(source, GlobalConfig::default(), UrlPolicy::FallbackWhenMultiple);
    assert!(fallback_only
        .code
        .contains("webp: { 400: { 1: require('./image.png?webp&width=400') }"));
    assert!(fallback_only
        .code
        .contains("fallback: { 400: { 1: require('./image.png?url&width=400') }"));

    let every_branch =
        run_full(source, GlobalConfig::default(), UrlPolicy::EveryBranchWhenMultiple);
    assert_eq!(
        every_branch.code.lines().nth(2).unwrap(),
        "<Img src={image} sizes={[400, 800]} webp rawSrc={{ fallback: { 400: { 1: require('./image.png?url&width=400') }, 800: { 1: require('./image.png?url&width=800') } }, webp: { 400: { 1: require('./image.png?webp&url&width=400') }, 800: { 1: require('./image.png?webp&url&width=800') } } }} />;"
    );

    let never = run_full(source, GlobalConfig::default(), UrlPolicy::Never);
    assert!(!never.code.contains("url&"));
}

#[test]
fn img_template_location_without_extension() {
    let output = run(
        "import Img from 'react-optimized-image';\n\
         const imageName = 'image.png';\n\
         <Img src={require(`./${imageName}`)} webp />;",
    );
    insta::assert_snapshot!(
        output.lines().nth(2).unwrap(),
        @"<Img src={require(`./${imageName}`)} webp rawSrc={{ fallback: { original: { 1: require(`./${imageName}?url`) } }, webp: { original: { 1: require(`./${imageName}?webp`) } } }} />;"
    );
}

// ============================================================================
// GLOBAL CONFIG
// ============================================================================

const THUMB_CONFIG: &str = r#"{
    "default": { "webp": true },
    "types": { "thumb": { "sizes": [100], "densities": [1, 2] } }
}"#;

#[test]
fn global_config_is_materialized() {
    let output = run_with_config(
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./a.png')} type=\"thumb\" />;",
        THUMB_CONFIG,
    );
    insta::assert_snapshot!(
        output.lines().nth(1).unwrap(),
        @r#"<Img src={require('./a.png')} type="thumb" webp sizes={[100]} densities={[1, 2]} rawSrc={{ fallback: { 100: { 1: require('./a.png?url&width=100'), 2: require('./a.png?url&width=200') } }, webp: { 100: { 1: require('./a.png?webp&width=100'), 2: require('./a.png?webp&width=200') } } }} />;"#
    );
}

#[test]
fn explicit_attributes_win_over_global_config() {
    let output = run_with_config(
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./a.png')} webp={false} />;",
        THUMB_CONFIG,
    );
    insta::assert_snapshot!(
        output.lines().nth(1).unwrap(),
        @"<Img src={require('./a.png')} webp={false} rawSrc={{ fallback: { original: { 1: require('./a.png') } } }} />;"
    );
}

#[test]
fn unknown_type_is_an_error() {
    let config = serde_json::from_str(THUMB_CONFIG).unwrap();
    let err = run_err(
        "import Img from 'react-optimized-image';\n\
         <Img src={require('./a.png')} type=\"hero\" />;",
        config,
    );
    insta::assert_snapshot!(err.to_string(), @"type `hero` not found in images.config");
    assert!(matches!(err, TransformError::UnknownType { ref name, .. } if name == "hero"));
}

#[test]
fn dynamic_boolean_is_an_error() {
    let source = "import Img from 'react-optimized-image';\n\
                  const enabled = true;\n\
                  <Img src={require('./a.png')} webp={enabled} />;";
    let err = run_err(source, GlobalConfig::default());
    insta::assert_snapshot!(err.to_string(), @"only static boolean values are allowed for `webp`");

    let position = err.line_col(source).unwrap();
    assert_eq!(position.line, 2);
    assert_eq!(
        position.col as usize,
        source.lines().nth(2).unwrap().find("{enabled}").unwrap()
    );
}

#[test]
fn dynamic_sizes_element_is_an_error() {
    let err = run_err(
        "import Img from 'react-optimized-image';\n\
         const small = 400;\n\
         <Img src={require('./a.png')} sizes={[small, 800]} />;",
        GlobalConfig::default(),
    );
    assert!(matches!(
        err,
        TransformError::StaticNumber { ref attribute, index: 0, .. } if attribute == "sizes"
    ));
}

#[test]
fn first_error_aborts_the_file() {
    let err = run_err(
        "import Img from 'react-optimized-image';\n\
         <div>\n\
           <Img src={require('./a.png')} webp={maybe} />\n\
           <Img src={require('./b.png')} sizes={large} />\n\
         </div>;",
        GlobalConfig::default(),
    );
    assert!(matches!(err, TransformError::StaticBoolean { .. }));
}

#[test]
fn syntax_errors_are_reported() {
    let err = run_err("const = ;", GlobalConfig::default());
    assert!(matches!(err, TransformError::Parse { .. }));
}

// ============================================================================
// SVG
// ============================================================================

#[test]
fn svg_moves_src_into_marker() {
    let output = run(
        "import { Svg } from 'react-optimized-image';\n\
         const icon = <Svg src={require('./icon.svg')} className=\"icon\" />;",
    );
    insta::assert_snapshot!(
        output.lines().nth(1).unwrap(),
        @r#"const icon = <Svg className="icon" rawSrc={require('./icon.svg?include')} />;"#
    );
}

#[test]
fn svg_after_other_attributes() {
    let output = run(
        "import { Svg } from 'react-optimized-image';\n\
         <Svg className=\"icon\" src={require('./icon.svg')} />;",
    );
    insta::assert_snapshot!(
        output.lines().nth(1).unwrap(),
        @r#"<Svg className="icon" rawSrc={require('./icon.svg?include')} />;"#
    );
}

#[test]
fn svg_dynamic_locations() {
    let output = run(
        "import { Svg } from 'react-optimized-image';\n\
         <Svg src={require('./icons/' + name + '.svg')} />;\n\
         <Svg src={require(`./icons/${name}.svg`)} />;",
    );
    assert_eq!(
        output.lines().skip(1).collect::<Vec<_>>(),
        vec![
            "<Svg rawSrc={require('./icons/' + name + '.svg?include')} />;",
            "<Svg rawSrc={require(`./icons/${name}.svg?include`)} />;",
        ]
    );
}

#[test]
fn svg_from_specific_component_module() {
    let output = run(
        "import Icon from 'react-optimized-image/lib/components/Svg';\n\
         <Icon src={require('./image.svg')} />;",
    );
    assert_eq!(
        output.lines().nth(1).unwrap(),
        "<Icon rawSrc={require('./image.svg?include')} />;"
    );
}

// ============================================================================
// RESOLUTION
// ============================================================================

#[test]
fn recursive_require_aliases() {
    let result = run_full(
        r#"import React from 'react';

const { Svg } = require('react-optimized-image');
const Img = require('react-optimized-image').default;

const ProxySvg = Svg;
const Icon = ProxySvg;

const ProxyImg = Img;
const Image = ProxyImg;

export default () => (
  <div>
    <Icon src={require('./image.svg')} />
    <Image src={require('./image.png')} webp />
  </div>
);
"#,
        GlobalConfig::default(),
        UrlPolicy::default(),
    );
    assert_eq!(kinds(&result), vec![ComponentKind::Svg, ComponentKind::Img]);
    assert!(result
        .code
        .contains("<Icon rawSrc={require('./image.svg?include')} />"));
}

#[test]
fn renamed_object_destructuring() {
    let result = run_full(
        "const { Svg: Icon, Img: Image } = require('react-optimized-image');\n\
         <div>\n\
           <Icon src={require('./image.svg')} />\n\
           <Image src={require('./image.jpg')} webp />\n\
         </div>;",
        GlobalConfig::default(),
        UrlPolicy::default(),
    );
    assert_eq!(kinds(&result), vec![ComponentKind::Svg, ComponentKind::Img]);
}

#[test]
fn transpiled_styled_components() {
    let result = run_full(
        r#"import Img, { Svg } from 'react-optimized-image';
import styled from 'styled-components';
import SvgImage from './image.svg';
import JpgImage from './image.jpg';

const StyledSvg = styled(Svg).withConfig({
  displayName: 'pages__Image',
  componentId: 'sc-13drr0w-1',
})(['background-color:red;']);

const StyledImg = styled(Img).withConfig({
  displayName: 'pages__Image',
  componentId: 'sc-13drr0w-1',
})(['background-color:red;']);

export default () => (
  <div>
    <StyledSvg src={SvgImage} />
    <StyledImg src={JpgImage} webp />
  </div>
);
"#,
        GlobalConfig::default(),
        UrlPolicy::default(),
    );
    assert_eq!(kinds(&result), vec![ComponentKind::Svg, ComponentKind::Img]);
    assert!(result
        .code
        .contains("<StyledSvg rawSrc={require('./image.svg?include')} />"));
    assert!(result.code.contains(
        "<StyledImg src={JpgImage} webp rawSrc={{ fallback: { original: { 1: require('./image.jpg?url') } }, webp: { original: { 1: require('./image.jpg?webp') } } }} />"
    ));
}

#[test]
fn recursive_styled_wrappers() {
    let result = run_full(
        "import Img from 'react-optimized-image';\n\
         import styled from '@emotion/styled';\n\
         const StyledImg = styled(Img)({ color: 'red' });\n\
         const Wrapped = styled(StyledImg)`margin: 0;`;\n\
         <Wrapped src={require('./a.png')} />;",
        GlobalConfig::default(),
        UrlPolicy::default(),
    );
    assert_eq!(kinds(&result), vec![ComponentKind::Img]);
}

#[test]
fn nested_object_notation() {
    let result = run_full(
        "import { Svg } from 'react-optimized-image';\n\
         import styled from 'styled-components';\n\
         const styles = { imgs: { StyledSvg: styled(Svg)`color: red;` } };\n\
         <styles.imgs.StyledSvg src={require('./image.svg')} />;",
        GlobalConfig::default(),
        UrlPolicy::default(),
    );
    assert_eq!(kinds(&result), vec![ComponentKind::Svg]);
    assert!(result
        .code
        .contains("<styles.imgs.StyledSvg rawSrc={require('./image.svg?include')} />"));
}

#[test]
fn namespace_member_tag() {
    let result = run_full(
        "import * as images from 'react-optimized-image';\n\
         <images.Svg src={require('./a.svg')} />;",
        GlobalConfig::default(),
        UrlPolicy::default(),
    );
    assert_eq!(kinds(&result), vec![ComponentKind::Svg]);
}

#[test]
fn unrelated_tags_are_untouched() {
    let source = "import Img from 'some-other-image';\n\
                  import { Svg } from 'react-optimized-image';\n\
                  <div>\n\
                    <Img src={require('./a.png')} />\n\
                    <Svg src={require('./data.json')} />\n\
                    <Svg src={icon} />\n\
                  </div>;";
    let result = run_full(source, GlobalConfig::default(), UrlPolicy::default());
    assert_eq!(result.code, source);
    assert!(!result.changed());
}

#[test]
fn shadowed_component_is_untouched() {
    let source = "import Img from 'react-optimized-image';\n\
                  function render(Img) {\n\
                    return <Img src={require('./a.png')} />;\n\
                  }";
    assert_eq!(run(source), source);
}

#[test]
fn shadowed_member_path_root_is_untouched() {
    let source = "import { Svg } from 'react-optimized-image';\n\
                  const styles = { Icon: Svg };\n\
                  function render(styles) {\n\
                    return <styles.Icon src={require('./a.svg')} />;\n\
                  }\n\
                  <styles.Icon src={require('./b.svg')} />;";
    let result = run_full(source, GlobalConfig::default(), UrlPolicy::default());
    assert_eq!(kinds(&result), vec![ComponentKind::Svg]);
    assert!(result.code.contains("<styles.Icon src={require('./a.svg')} />"));
    assert!(result
        .code
        .contains("<styles.Icon rawSrc={require('./b.svg?include')} />"));
}

#[test]
fn hoisted_var_resolves_from_its_block() {
    let result = run_full(
        "import { Svg } from 'react-optimized-image';\n\
         function render() {\n\
           {\n\
             const Inner = Svg;\n\
             var Icon = Inner;\n\
           }\n\
           return <Icon src={require('./a.svg')} />;\n\
         }",
        GlobalConfig::default(),
        UrlPolicy::default(),
    );
    assert_eq!(kinds(&result), vec![ComponentKind::Svg]);
}

// ============================================================================
// SOURCE TEXT EDGE CASES
// ============================================================================

#[test]
fn byte_order_mark_is_preserved() {
    let output = run(
        "\u{feff}import { Svg } from 'react-optimized-image';\n<Svg src={require('./a.svg')} />;",
    );
    assert_eq!(
        output,
        "\u{feff}import { Svg } from 'react-optimized-image';\n<Svg rawSrc={require('./a.svg?include')} />;"
    );
}

#[test]
fn non_ascii_text_before_tags() {
    let output = run(
        "import Img from 'react-optimized-image';\n\
         const título = 'Größe ✓';\n\
         <Img alt=\"café\" src={require('./bild.png')} />;",
    );
    assert!(output.contains(
        "<Img alt=\"café\" src={require('./bild.png')} rawSrc={{ fallback: { original: { 1: require('./bild.png') } } }} />;"
    ));
}

#[test]
fn wrapped_concatenation_tail() {
    let output = run(
        "import { Svg } from 'react-optimized-image';\n\
         <Svg src={require('./' + name + ('.svg'))} />;",
    );
    assert!(output.contains("<Svg rawSrc={require('./' + name + ('.svg?include'))} />;"));
}

#[test]
fn typescript_wrapped_locations() {
    let options = TransformOptions {
        filename: Some(Utf8PathBuf::from("page.tsx")),
        ..TransformOptions::default()
    };
    let result = transform_checked(
        "import { Svg } from 'react-optimized-image';\n\
         const a = <Svg src={require('./' + name + ('.svg' as string))} />;\n\
         const b = <Svg src={require((`./${name}.svg`))} />;\n",
        &options,
    );
    assert!(result
        .code
        .contains("<Svg rawSrc={require('./' + name + ('.svg?include' as string))} />"));
    assert!(result
        .code
        .contains("<Svg rawSrc={require(`./${name}.svg?include`)} />"));
}

#[test]
fn comments_before_src_are_kept() {
    let output = run(
        "import { Svg } from 'react-optimized-image';\n\
         <Svg className=\"icon\" /* inline */ src={require('./a.svg')} />;",
    );
    assert!(output.contains(
        "<Svg className=\"icon\" /* inline */ rawSrc={require('./a.svg?include')} />;"
    ));

    let output = run(
        "import { Svg } from 'react-optimized-image';\n\
         <Svg\n  className=\"icon\"\n  // inline\n  src={require('./a.svg')}\n/>;",
    );
    assert!(output.contains("// inline\n"));
    assert!(output.contains("rawSrc={require('./a.svg?include')}"));
    assert!(!output.contains("// inline rawSrc"));
}

#[test]
fn query_values_are_escaped() {
    let output = run(
        "import { Svg } from 'react-optimized-image';\n\
         <Svg src={require('./a.svg?label=my icon')} />;",
    );
    assert!(output.contains("rawSrc={require('./a.svg?label=my%20icon&include')}"));
}

#[test]
fn config_files_reject_zero_sizes() {
    let err = GlobalConfig::from_json(
        Utf8Path::new("images.config.json"),
        r#"{ "default": { "sizes": [0, 400], "densities": [0] } }"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("`default.sizes`"));
}

// ============================================================================
// WHOLE-FILE BEHAVIOUR
// ============================================================================

#[test]
fn rewriting_is_idempotent() {
    let source = "import Img, { Svg } from 'react-optimized-image';\n\
                  // keep this comment\n\
                  <div>\n\
                    <Img src={require('./a.png')} sizes={[400, 800]} webp />\n\
                    <Svg src={require('./b.svg')} />\n\
                  </div>;\n";
    let once = run_full(source, GlobalConfig::default(), UrlPolicy::default());
    assert_eq!(once.tags.len(), 2);
    assert!(once.code.contains("// keep this comment"));

    let twice = run_full(&once.code, GlobalConfig::default(), UrlPolicy::default());
    assert_eq!(twice.code, once.code);
    assert!(twice.tags.is_empty());
}

#[test]
fn offsets_map_back_to_the_input() {
    let source = "import { Svg } from 'react-optimized-image';\n\
                  <Svg src={require('./a.svg')} />;\n\
                  const after = 1;\n";
    let result = run_full(source, GlobalConfig::default(), UrlPolicy::default());
    let generated = result.code.find("const after").unwrap() as u32;
    let original = source.find("const after").unwrap() as u32;
    assert_eq!(
        result.offsets.original_offset(generated.into()),
        Some(original.into())
    );
}

#[test]
fn styled_component_from_another_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    std::fs::write(
        root.join("styles.js"),
        "import styled from 'styled-components';\n\
         import { Svg } from 'react-optimized-image';\n\
         export const StyledSvg = styled(Svg)`\n  color: red;\n`;\n",
    )
    .unwrap();

    let source = "import { StyledSvg } from './styles';\n\
                  export default () => <StyledSvg src={require('./icon.svg')} />;\n";
    let options = TransformOptions {
        filename: Some(root.join("page.jsx")),
        ..TransformOptions::default()
    };
    let result = transform(source, &options).unwrap();
    assert_eq!(kinds(&result), vec![ComponentKind::Svg]);
    assert!(result
        .code
        .contains("<StyledSvg rawSrc={require('./icon.svg?include')} />"));
}
