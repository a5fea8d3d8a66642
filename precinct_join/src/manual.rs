/*!

This is the long-form manual for `precinct_join` and `precinctmap`.

## Inputs

Two files are joined:
* the precinct results, one row per candidate per precinct
* the precinct boundaries, as a GeoJSON `FeatureCollection`

### Results file

A semicolon-delimited file without header, with 16 columns in this order:

| index | content          | used |
|-------|------------------|------|
| 0     | state            |      |
| 1     | county id        | yes  |
| 2     | precinct id      | yes  |
| 3     | office id        | only with the `officeId` filter |
| 4     | office name      |      |
| 5     | unused           |      |
| 6     | committee code   |      |
| 7     | candidate name   |      |
| 8-9   | unused           |      |
| 10    | party code       | yes (category) |
| 11-12 | unused           |      |
| 13    | votes            | yes  |
| 14    | percentage       | yes  |
| 15    | precinct total   | yes  |

Numeric precinct ids shorter than 4 digits are padded with zeros (`7` becomes `0007`).

### Geometry file

Each feature must carry a county identifier (number or numeric string) and a
precinct identifier (string). The precinct identifier may be the local
4-character code or a longer code ending with it, such as a voting district id.

## The canonical key

Both inputs are matched on a 6-character key: the county on 2 zero-padded
digits followed by the last 4 characters of the precinct identifier. County 3
and precinct `0007` give `030007`, and so does county 3 with precinct
`270030007`. Counties must be in `0..=99` and precinct identifiers must have at
least 4 characters; anything else stops the run.

## Join policies

* `exclusionPolicy`: `excludeOnMissing` (default) drops a precinct for which a
  category has no result; `failFast` stops the run instead.
* `duplicatePolicy`: `reject` (default) stops the run when two results of the
  same category share a key; `keepFirst` keeps the first one and logs the others.

A precinct whose total is zero is always dropped. When the categories report
different totals for the same precinct, a warning is logged and the total of
the first category is used.

After the join, each kept feature gets:
* `PrecinctCountyCode`: the canonical key
* `Total`
* `<label>Votes` and `<label>Perc` for each category

and loses `PrecinctID`, `County`, `CountyID`, `CongDist`, `MNSenDist`,
`MNLegDist` and `CtyComDist`.

## Configuration

The `--config` flag takes a JSON file. All the keys are optional unless noted.

```json
{
  "outputSettings": {
    "contestName": "2024 US President",
    "outputFile": "build/map.geojson",
    "caption": "Percentage of Vote Won by DFL (%)"
  },
  "resultsSource": { "filePath": "USPresPct.txt", "delimiter": ";", "officeId": "0102" },
  "geometrySource": {
    "filePath": "mn-precincts.json",
    "countyField": "CountyID",
    "precinctField": "PrecinctID",
    "keyField": "PrecinctCountyCode",
    "stripFields": ["PrecinctID", "County", "CountyID"]
  },
  "categories": [
    { "code": "DFL", "label": "Harris" },
    { "code": "R", "label": "Trump" }
  ],
  "rules": { "exclusionPolicy": "excludeOnMissing", "duplicatePolicy": "reject" },
  "colorScale": { "bins": 11, "min": 0, "max": 100 },
  "tooltip": [ { "field": "Precinct", "alias": "Precinct:" } ]
}
```

`contestName`, `resultsSource.filePath` and `geometrySource.filePath` are
required. Paths are relative to the configuration file.

The color scale either has `bins` bins of equal width over `[min, max]`, or
the bins given by `thresholds` (a list of increasing edges). The colors are
sampled from the red to blue palette, or from `colors` (a list of `#rrggbb`
values) when provided. A value on an edge falls in the bin above it, except the
maximum which falls in the last bin.

## Output

The output is a GeoJSON `FeatureCollection` with:
* the annotated features, each with its style under `properties.style`
  (`fillColor`, `color`, `weight`, `fillOpacity`)
* `legend`: the caption and the bins with their colors
* `tooltip`: the fields to show on hover and their labels

*/
